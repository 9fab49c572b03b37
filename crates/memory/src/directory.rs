//! In-process backing for the structured admin store.
//!
//! Answers the closed `DirectoryQuery` set from live session state, plus
//! the conversation archive when one is configured. Keeps the Admin
//! handler decoupled from where the numbers actually come from.

use async_trait::async_trait;
use campanile_core::directory::{DirectoryQuery, DirectoryRow, DirectoryStore};
use campanile_core::error::DirectoryError;
use std::sync::Arc;

use crate::store::SessionManager;

pub struct MemoryDirectory {
    sessions: Arc<SessionManager>,
    #[cfg(feature = "sqlite")]
    archive: Option<Arc<crate::archive::ConversationArchive>>,
}

impl MemoryDirectory {
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self {
            sessions,
            #[cfg(feature = "sqlite")]
            archive: None,
        }
    }

    /// Attach a conversation archive to serve `RecentConversations`.
    #[cfg(feature = "sqlite")]
    pub fn with_archive(mut self, archive: Arc<crate::archive::ConversationArchive>) -> Self {
        self.archive = Some(archive);
        self
    }

    #[cfg(feature = "sqlite")]
    async fn recent_conversations(
        &self,
        limit: usize,
    ) -> Result<Vec<DirectoryRow>, DirectoryError> {
        let Some(archive) = &self.archive else {
            return Err(DirectoryError::Unavailable(
                "conversation archive not configured".into(),
            ));
        };
        let exchanges = archive
            .recent(limit)
            .await
            .map_err(|e| DirectoryError::LookupFailed(e.to_string()))?;
        Ok(exchanges
            .into_iter()
            .map(|x| {
                DirectoryRow::new(vec![
                    ("session", x.session_id),
                    ("question", x.question),
                    ("handler", x.handler),
                    ("when", x.created_at.to_rfc3339()),
                ])
            })
            .collect())
    }

    #[cfg(not(feature = "sqlite"))]
    async fn recent_conversations(
        &self,
        _limit: usize,
    ) -> Result<Vec<DirectoryRow>, DirectoryError> {
        Err(DirectoryError::Unavailable(
            "conversation archive not compiled in".into(),
        ))
    }
}

#[async_trait]
impl DirectoryStore for MemoryDirectory {
    async fn query(&self, query: DirectoryQuery) -> Result<Vec<DirectoryRow>, DirectoryError> {
        match query {
            DirectoryQuery::UserCount => {
                let count = self.sessions.distinct_users().await.len();
                Ok(vec![DirectoryRow::new(vec![(
                    "user_count",
                    count.to_string(),
                )])])
            }
            DirectoryQuery::UsersByRole { role } => {
                let users = self.sessions.users_with_role(role).await;
                Ok(users
                    .into_iter()
                    .map(|user| {
                        DirectoryRow::new(vec![("user", user), ("role", role.to_string())])
                    })
                    .collect())
            }
            DirectoryQuery::RecentConversations { limit } => {
                self.recent_conversations(limit).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campanile_core::session::Role;
    use chrono::Duration;

    async fn directory_with_users() -> MemoryDirectory {
        let sessions = Arc::new(SessionManager::new(10, Duration::minutes(60)));
        sessions.create_session("amina", Role::Student).await;
        sessions.create_session("besim", Role::Faculty).await;
        sessions.create_session("drita", Role::Admin).await;
        MemoryDirectory::new(sessions)
    }

    #[tokio::test]
    async fn user_count_row() {
        let directory = directory_with_users().await;
        let rows = directory.query(DirectoryQuery::UserCount).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].columns[0], ("user_count".to_string(), "3".to_string()));
    }

    #[tokio::test]
    async fn users_by_role_rows() {
        let directory = directory_with_users().await;
        let rows = directory
            .query(DirectoryQuery::UsersByRole { role: Role::Faculty })
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].columns[0].1, "besim");
        assert_eq!(rows[0].columns[1].1, "faculty");
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn recent_conversations_without_archive_is_unavailable() {
        let directory = directory_with_users().await;
        let result = directory
            .query(DirectoryQuery::RecentConversations { limit: 5 })
            .await;
        assert!(matches!(result, Err(DirectoryError::Unavailable(_))));
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn recent_conversations_from_archive() {
        use crate::archive::{ArchivedExchange, ConversationArchive};

        let sessions = Arc::new(SessionManager::new(10, Duration::minutes(60)));
        let archive = Arc::new(ConversationArchive::new("sqlite::memory:").await.unwrap());
        archive
            .record(&ArchivedExchange {
                session_id: "s-1".into(),
                question: "When does the library open?".into(),
                answer: "At 8am on weekdays.".into(),
                handler: "qa".into(),
                cached: false,
                citation_count: 1,
                created_at: chrono::Utc::now(),
            })
            .await
            .unwrap();

        let directory = MemoryDirectory::new(sessions).with_archive(archive);
        let rows = directory
            .query(DirectoryQuery::RecentConversations { limit: 5 })
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].columns[1].1, "When does the library open?");
    }
}
