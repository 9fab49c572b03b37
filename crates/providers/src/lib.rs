//! Model provider implementations for Campanile.
//!
//! All providers implement the `campanile_core` provider traits.
//! `build_providers` wires the configured Gemini backend behind retry
//! wrappers so callers see at most one failure per logical request.

pub mod gemini;
pub mod retry;

pub use gemini::GeminiProvider;
pub use retry::{RetryEmbedding, RetryGeneration};

use campanile_config::{AppConfig, ConfigError};
use campanile_core::provider::{EmbeddingProvider, GenerationProvider};
use std::sync::Arc;
use std::time::Duration;

/// Build the generation and embedding services from configuration.
///
/// Both share one Gemini backend; each gets its own retry wrapper.
pub fn build_providers(
    config: &AppConfig,
) -> Result<(Arc<dyn GenerationProvider>, Arc<dyn EmbeddingProvider>), ConfigError> {
    let gemini = Arc::new(GeminiProvider::from_config(config)?);
    let attempts = config.provider.max_retries.max(1);
    let backoff = Duration::from_millis(config.provider.retry_backoff_ms);

    let generation: Arc<dyn GenerationProvider> =
        Arc::new(RetryGeneration::new(gemini.clone(), attempts, backoff));
    let embedding: Arc<dyn EmbeddingProvider> =
        Arc::new(RetryEmbedding::new(gemini, attempts, backoff));

    Ok((generation, embedding))
}
