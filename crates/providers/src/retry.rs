//! Retry wrappers — bounded retries with linear backoff for transient failures.
//!
//! Rate limits, timeouts, network blips, and 5xx responses get retried;
//! auth and request-shape failures fail immediately since repeating them
//! cannot change the outcome.

use async_trait::async_trait;
use campanile_core::error::ProviderError;
use campanile_core::provider::{EmbeddingProvider, GenerationProvider, GenerationRequest};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// A generation provider that retries transient failures.
pub struct RetryGeneration {
    inner: Arc<dyn GenerationProvider>,
    max_attempts: u32,
    backoff: Duration,
}

impl RetryGeneration {
    /// Wrap a provider. `max_attempts` counts the first try; backoff between
    /// attempts grows linearly (`backoff * attempt`).
    pub fn new(inner: Arc<dyn GenerationProvider>, max_attempts: u32, backoff: Duration) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }
}

#[async_trait]
impl GenerationProvider for RetryGeneration {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<String, ProviderError> {
        let mut attempt = 1;
        loop {
            match self.inner.complete(request.clone()).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    let delay = self.backoff * attempt;
                    warn!(
                        provider = %self.inner.name(),
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient generation failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        self.inner.health_check().await
    }
}

/// An embedding provider that retries transient failures.
pub struct RetryEmbedding {
    inner: Arc<dyn EmbeddingProvider>,
    max_attempts: u32,
    backoff: Duration,
}

impl RetryEmbedding {
    pub fn new(inner: Arc<dyn EmbeddingProvider>, max_attempts: u32, backoff: Duration) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for RetryEmbedding {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, ProviderError> {
        let mut attempt = 1;
        loop {
            match self.inner.embed(text).await {
                Ok(vector) => return Ok(vector),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    let delay = self.backoff * attempt;
                    warn!(
                        provider = %self.inner.name(),
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient embedding failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }
}
