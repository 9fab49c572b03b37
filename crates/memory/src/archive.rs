//! SQLite conversation archive.
//!
//! Durable record of completed exchanges, append-only. Serves the admin
//! `RecentConversations` lookup and survives process restarts; live session
//! windows never read from it.

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

use campanile_core::error::MemoryError;

/// One completed question/answer exchange, as persisted.
#[derive(Debug, Clone)]
pub struct ArchivedExchange {
    pub session_id: String,
    pub question: String,
    pub answer: String,
    pub handler: String,
    pub cached: bool,
    pub citation_count: u32,
    pub created_at: DateTime<Utc>,
}

pub struct ConversationArchive {
    pool: SqlitePool,
}

impl ConversationArchive {
    /// Open (or create) the archive at a SQLite path.
    ///
    /// Pass `"sqlite::memory:"` for an in-process ephemeral database
    /// (useful for tests).
    pub async fn new(path: &str) -> Result<Self, MemoryError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| MemoryError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to open SQLite: {e}")))?;

        let archive = Self { pool };
        archive.run_migrations().await?;
        info!("Conversation archive initialized at {path}");
        Ok(archive)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, MemoryError> {
        let archive = Self { pool };
        archive.run_migrations().await?;
        Ok(archive)
    }

    async fn run_migrations(&self) -> Result<(), MemoryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS conversations (
                iid            INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id     TEXT NOT NULL,
                question       TEXT NOT NULL,
                answer         TEXT NOT NULL,
                handler        TEXT NOT NULL,
                cached         INTEGER NOT NULL DEFAULT 0,
                citation_count INTEGER NOT NULL DEFAULT 0,
                created_at     TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("conversations table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_conversations_created_at \
             ON conversations(created_at DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("created_at index: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_conversations_session \
             ON conversations(session_id)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("session index: {e}")))?;

        debug!("Archive migrations complete");
        Ok(())
    }

    fn row_to_exchange(row: &sqlx::sqlite::SqliteRow) -> Result<ArchivedExchange, MemoryError> {
        let session_id: String = row
            .try_get("session_id")
            .map_err(|e| MemoryError::QueryFailed(format!("session_id column: {e}")))?;
        let question: String = row
            .try_get("question")
            .map_err(|e| MemoryError::QueryFailed(format!("question column: {e}")))?;
        let answer: String = row
            .try_get("answer")
            .map_err(|e| MemoryError::QueryFailed(format!("answer column: {e}")))?;
        let handler: String = row
            .try_get("handler")
            .map_err(|e| MemoryError::QueryFailed(format!("handler column: {e}")))?;
        let cached: i64 = row
            .try_get("cached")
            .map_err(|e| MemoryError::QueryFailed(format!("cached column: {e}")))?;
        let citation_count: i64 = row
            .try_get("citation_count")
            .map_err(|e| MemoryError::QueryFailed(format!("citation_count column: {e}")))?;
        let created_at_str: String = row
            .try_get("created_at")
            .map_err(|e| MemoryError::QueryFailed(format!("created_at column: {e}")))?;

        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(ArchivedExchange {
            session_id,
            question,
            answer,
            handler,
            cached: cached != 0,
            citation_count: citation_count as u32,
            created_at,
        })
    }

    /// Append one completed exchange.
    pub async fn record(&self, exchange: &ArchivedExchange) -> Result<(), MemoryError> {
        sqlx::query(
            r#"
            INSERT INTO conversations
                (session_id, question, answer, handler, cached, citation_count, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&exchange.session_id)
        .bind(&exchange.question)
        .bind(&exchange.answer)
        .bind(&exchange.handler)
        .bind(exchange.cached as i64)
        .bind(exchange.citation_count as i64)
        .bind(exchange.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::Storage(format!("INSERT failed: {e}")))?;

        debug!(session = %exchange.session_id, handler = %exchange.handler, "Exchange archived");
        Ok(())
    }

    /// The most recent exchanges, newest first.
    pub async fn recent(&self, limit: usize) -> Result<Vec<ArchivedExchange>, MemoryError> {
        let rows = sqlx::query(
            "SELECT * FROM conversations ORDER BY created_at DESC, iid DESC LIMIT ?1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MemoryError::QueryFailed(format!("recent: {e}")))?;

        rows.iter().map(Self::row_to_exchange).collect()
    }

    /// Total archived exchange count.
    pub async fn count(&self) -> Result<u64, MemoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM conversations")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| MemoryError::QueryFailed(format!("count: {e}")))?;
        let n: i64 = row
            .try_get("n")
            .map_err(|e| MemoryError::QueryFailed(format!("count column: {e}")))?;
        Ok(n as u64)
    }
}
