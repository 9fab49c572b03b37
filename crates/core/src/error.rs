//! Error types for the Campanile domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant. Per-request failures
//! never cross the orchestrator boundary as errors; they degrade into an
//! `AgentResponse` with the error flag set. The only fatal class is a
//! configuration error at startup.

use thiserror::Error;

/// The top-level error type for all Campanile operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors (generation + embedding services) ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Retrieval errors ---
    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    // --- Memory errors ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    // --- Directory (structured admin store) errors ---
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response shape: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Whether a bounded retry with backoff is worth attempting.
    ///
    /// Auth and request-shape failures are deterministic and repeat on retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. }
                | Self::Timeout(_)
                | Self::Network(_)
                | Self::ApiError { status_code: 500..=599, .. }
        )
    }
}

#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    #[error("Corpus unavailable: {0}")]
    Unavailable(String),

    #[error("Query embedding failed: {0}")]
    Embedding(#[source] ProviderError),
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Unknown session: {0}")]
    SessionNotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    #[error("Directory store unavailable: {0}")]
    Unavailable(String),

    #[error("Lookup failed: {0}")]
    LookupFailed(String),
}
