//! Session-scoped conversation memory.
//!
//! Each session keeps a bounded sliding window of turns; when the window
//! is full, the oldest turn drops. Sessions expire after an idle timeout
//! and expired sessions are purged lazily on the next create.

use campanile_core::error::MemoryError;
use campanile_core::session::{Role, Session, SessionId, Turn};
use chrono::{Duration, Utc};
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;
use tracing::debug;

struct SessionEntry {
    session: Session,
    turns: VecDeque<Turn>,
}

/// Holds every live session and its turn window.
///
/// All access goes through one lock, so appends within a session are
/// serialized and a reader never observes a half-applied append.
pub struct SessionManager {
    sessions: RwLock<HashMap<SessionId, SessionEntry>>,
    window: usize,
    idle_ttl: Duration,
}

impl SessionManager {
    /// `window` is the number of turns retained per session (user and
    /// assistant turns each count); `idle_ttl` is the idle expiry.
    pub fn new(window: usize, idle_ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            window: window.max(1),
            idle_ttl,
        }
    }

    /// Create a session for an authenticated user. Purges expired
    /// sessions as a side effect.
    pub async fn create_session(&self, user: impl Into<String>, role: Role) -> Session {
        let session = Session::new(user, role, self.idle_ttl);
        let mut sessions = self.sessions.write().await;

        let now = Utc::now();
        sessions.retain(|_, e| !e.session.is_expired(now));

        debug!(session = %session.id, user = %session.user, role = %session.role, "Session created");
        sessions.insert(
            session.id.clone(),
            SessionEntry {
                session: session.clone(),
                turns: VecDeque::new(),
            },
        );
        session
    }

    /// Look up a live session. Expired sessions count as absent.
    pub async fn get(&self, id: &SessionId) -> Option<Session> {
        let sessions = self.sessions.read().await;
        let entry = sessions.get(id)?;
        if entry.session.is_expired(Utc::now()) {
            return None;
        }
        Some(entry.session.clone())
    }

    /// Append a turn to a session's window, dropping the oldest turn if
    /// the window is full. Also extends the session's idle expiry.
    pub async fn append(&self, id: &SessionId, turn: Turn) -> Result<(), MemoryError> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .get_mut(id)
            .ok_or_else(|| MemoryError::SessionNotFound(id.to_string()))?;

        entry.turns.push_back(turn);
        while entry.turns.len() > self.window {
            entry.turns.pop_front();
        }
        entry.session.expires_at = Utc::now() + self.idle_ttl;
        Ok(())
    }

    /// The most recent `n` turns of one session, oldest first.
    ///
    /// Only this session's turns are visible; there is no cross-session
    /// read path.
    pub async fn recent(&self, id: &SessionId, n: usize) -> Result<Vec<Turn>, MemoryError> {
        let sessions = self.sessions.read().await;
        let entry = sessions
            .get(id)
            .ok_or_else(|| MemoryError::SessionNotFound(id.to_string()))?;

        let skip = entry.turns.len().saturating_sub(n);
        Ok(entry.turns.iter().skip(skip).cloned().collect())
    }

    /// Remove a session and its history. Returns whether it existed.
    pub async fn end_session(&self, id: &SessionId) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    /// Drop all idle-expired sessions; returns how many were dropped.
    pub async fn expire_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let now = Utc::now();
        let before = sessions.len();
        sessions.retain(|_, e| !e.session.is_expired(now));
        before - sessions.len()
    }

    /// Number of live sessions.
    pub async fn active_sessions(&self) -> usize {
        let sessions = self.sessions.read().await;
        let now = Utc::now();
        sessions
            .values()
            .filter(|e| !e.session.is_expired(now))
            .count()
    }

    /// Distinct user names across live sessions.
    pub async fn distinct_users(&self) -> Vec<String> {
        let sessions = self.sessions.read().await;
        let now = Utc::now();
        let mut users: Vec<String> = sessions
            .values()
            .filter(|e| !e.session.is_expired(now))
            .map(|e| e.session.user.clone())
            .collect();
        users.sort();
        users.dedup();
        users
    }

    /// Users holding a given role across live sessions.
    pub async fn users_with_role(&self, role: Role) -> Vec<String> {
        let sessions = self.sessions.read().await;
        let now = Utc::now();
        let mut users: Vec<String> = sessions
            .values()
            .filter(|e| !e.session.is_expired(now) && e.session.role == role)
            .map(|e| e.session.user.clone())
            .collect();
        users.sort();
        users.dedup();
        users
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(window: usize) -> SessionManager {
        SessionManager::new(window, Duration::minutes(60))
    }

    #[tokio::test]
    async fn create_and_get_session() {
        let mgr = manager(10);
        let session = mgr.create_session("amina", Role::Student).await;

        let fetched = mgr.get(&session.id).await.unwrap();
        assert_eq!(fetched.user, "amina");
        assert_eq!(fetched.role, Role::Student);
    }

    #[tokio::test]
    async fn append_and_recent_in_order() {
        let mgr = manager(10);
        let session = mgr.create_session("amina", Role::Student).await;

        mgr.append(&session.id, Turn::user("When does enrollment open?"))
            .await
            .unwrap();
        mgr.append(&session.id, Turn::assistant("In September."))
            .await
            .unwrap();

        let turns = mgr.recent(&session.id, 10).await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].content, "When does enrollment open?");
        assert_eq!(turns[1].content, "In September.");
    }

    #[tokio::test]
    async fn window_drops_oldest_turn() {
        let mgr = manager(3);
        let session = mgr.create_session("amina", Role::Student).await;

        for i in 0..5 {
            mgr.append(&session.id, Turn::user(format!("message {i}")))
                .await
                .unwrap();
        }

        let turns = mgr.recent(&session.id, 10).await.unwrap();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].content, "message 2");
        assert_eq!(turns[2].content, "message 4");
    }

    #[tokio::test]
    async fn recent_limits_to_n() {
        let mgr = manager(10);
        let session = mgr.create_session("amina", Role::Student).await;

        for i in 0..6 {
            mgr.append(&session.id, Turn::user(format!("message {i}")))
                .await
                .unwrap();
        }

        let turns = mgr.recent(&session.id, 2).await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].content, "message 4");
        assert_eq!(turns[1].content, "message 5");
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let mgr = manager(10);
        let s1 = mgr.create_session("amina", Role::Student).await;
        let s2 = mgr.create_session("besim", Role::Student).await;

        mgr.append(&s1.id, Turn::user("my question about fees"))
            .await
            .unwrap();

        let other = mgr.recent(&s2.id, 10).await.unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn unknown_session_rejected() {
        let mgr = manager(10);
        let missing = SessionId::new();
        assert!(matches!(
            mgr.append(&missing, Turn::user("hi")).await,
            Err(MemoryError::SessionNotFound(_))
        ));
        assert!(matches!(
            mgr.recent(&missing, 5).await,
            Err(MemoryError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn end_session_removes_history() {
        let mgr = manager(10);
        let session = mgr.create_session("amina", Role::Student).await;
        mgr.append(&session.id, Turn::user("hello")).await.unwrap();

        assert!(mgr.end_session(&session.id).await);
        assert!(mgr.get(&session.id).await.is_none());
        assert!(!mgr.end_session(&session.id).await);
    }

    #[tokio::test]
    async fn idle_sessions_expire() {
        let mgr = SessionManager::new(10, Duration::milliseconds(5));
        let session = mgr.create_session("amina", Role::Student).await;

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(mgr.get(&session.id).await.is_none());
        assert_eq!(mgr.expire_idle().await, 1);
        assert_eq!(mgr.active_sessions().await, 0);
    }

    #[tokio::test]
    async fn append_extends_idle_expiry() {
        let mgr = SessionManager::new(10, Duration::milliseconds(60));
        let session = mgr.create_session("amina", Role::Student).await;

        // Keep the session alive past its original expiry by appending
        for _ in 0..4 {
            tokio::time::sleep(std::time::Duration::from_millis(25)).await;
            mgr.append(&session.id, Turn::user("still here")).await.unwrap();
        }
        assert!(mgr.get(&session.id).await.is_some());
    }

    #[tokio::test]
    async fn user_listings_by_role() {
        let mgr = manager(10);
        mgr.create_session("amina", Role::Student).await;
        mgr.create_session("besim", Role::Faculty).await;
        mgr.create_session("drita", Role::Admin).await;
        mgr.create_session("amina", Role::Student).await; // second device

        assert_eq!(mgr.distinct_users().await.len(), 3);
        assert_eq!(mgr.users_with_role(Role::Faculty).await, vec!["besim"]);
    }
}
