//! Provider traits — the abstractions over the generation and embedding
//! services.
//!
//! The two services are separate collaborators with separate failure modes
//! (a generation quota exhaustion does not imply embedding is down), so they
//! are separate traits even when one backend implements both.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// A single bounded generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The model to use (e.g., "gemini-2.5-flash").
    pub model: String,

    /// The fully assembled prompt text.
    pub prompt: String,

    /// Temperature (0.0 = deterministic).
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

fn default_temperature() -> f32 {
    0.3
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            temperature: default_temperature(),
            max_output_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_output_tokens(mut self, max: u32) -> Self {
        self.max_output_tokens = Some(max);
        self
    }
}

/// The generation service: prompt in, completed text out.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// A human-readable name for this provider (e.g., "gemini").
    fn name(&self) -> &str;

    /// Send a request and get the completed text.
    async fn complete(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<String, ProviderError>;

    /// Health check — can we reach the provider?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}

/// The embedding service: text in, fixed-dimension vector out.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// A human-readable name for this provider.
    fn name(&self) -> &str;

    /// Embed a single text into a fixed-dimension vector.
    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, ProviderError>;

    /// The dimension every returned vector has.
    fn dimension(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_request_builder() {
        let req = GenerationRequest::new("gemini-2.5-flash", "Question: hello")
            .with_temperature(0.0)
            .with_max_output_tokens(256);
        assert_eq!(req.model, "gemini-2.5-flash");
        assert!((req.temperature - 0.0).abs() < f32::EPSILON);
        assert_eq!(req.max_output_tokens, Some(256));
    }

    #[test]
    fn generation_request_default_temperature() {
        let req = GenerationRequest::new("gemini-2.5-flash", "hi");
        assert!((req.temperature - 0.3).abs() < f32::EPSILON);
        assert!(req.max_output_tokens.is_none());
    }
}
