//! Gemini provider implementation.
//!
//! Talks to the Generative Language API (`generativelanguage.googleapis.com`)
//! over REST. One struct serves both the generation and embedding traits
//! since the two endpoints share auth, transport, and error shapes.

use async_trait::async_trait;
use campanile_config::{AppConfig, ConfigError};
use campanile_core::error::ProviderError;
use campanile_core::provider::{EmbeddingProvider, GenerationProvider, GenerationRequest};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// A Gemini API provider.
///
/// Generation requests carry their own model name; the embedding model and
/// dimension are fixed per instance because every corpus vector must come
/// from the same space.
pub struct GeminiProvider {
    base_url: String,
    api_key: String,
    embedding_model: String,
    embedding_dimension: usize,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Create a new Gemini provider with the given request timeout.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            embedding_model: "gemini-embedding-001".into(),
            embedding_dimension: 768,
            client,
        }
    }

    /// Build from application configuration. Fails if no API key is set.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let api_key = config.require_api_key()?;
        let mut provider = Self::new(api_key, Duration::from_secs(config.provider.timeout_secs));
        provider.embedding_model = config.provider.embedding_model.clone();
        provider.embedding_dimension = config.provider.embedding_dimension;
        Ok(provider)
    }

    /// Override the base URL (self-hosted proxies, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Map an HTTP error status to a `ProviderError`.
    async fn status_error(endpoint: &str, response: reqwest::Response) -> ProviderError {
        let status = response.status().as_u16();
        match status {
            429 => ProviderError::RateLimited {
                retry_after_secs: 5,
            },
            401 | 403 => ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ),
            404 => ProviderError::ModelNotFound(endpoint.to_string()),
            _ => {
                let error_body = response.text().await.unwrap_or_default();
                warn!(status, endpoint, body = %error_body, "Provider returned error");
                ProviderError::ApiError {
                    status_code: status,
                    message: error_body,
                }
            }
        }
    }

    fn send_error(endpoint: &str, e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout(format!("{endpoint}: {e}"))
        } else {
            ProviderError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl GenerationProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<String, ProviderError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, request.model
        );

        let body = GenerateContentRequest {
            contents: vec![ApiContent {
                role: Some("user".into()),
                parts: vec![ApiPart {
                    text: request.prompt,
                }],
            }],
            generation_config: ApiGenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens,
            },
        };

        debug!(provider = "gemini", model = %request.model, "Sending generation request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::send_error("generateContent", e))?;

        if !response.status().is_success() {
            return Err(Self::status_error(&request.model, response).await);
        }

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("generateContent: {e}")))?;

        extract_text(api_response)
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| Self::send_error("models", e))?;

        Ok(response.status().is_success())
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, ProviderError> {
        let url = format!(
            "{}/models/{}:embedContent",
            self.base_url, self.embedding_model
        );

        let body = EmbedContentRequest {
            content: ApiContent {
                role: None,
                parts: vec![ApiPart { text: text.into() }],
            },
            output_dimensionality: Some(self.embedding_dimension),
        };

        debug!(
            provider = "gemini",
            model = %self.embedding_model,
            chars = text.chars().count(),
            "Sending embedding request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::send_error("embedContent", e))?;

        if !response.status().is_success() {
            return Err(Self::status_error(&self.embedding_model, response).await);
        }

        let api_response: EmbedContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("embedContent: {e}")))?;

        let values = api_response.embedding.values;
        if values.len() != self.embedding_dimension {
            return Err(ProviderError::InvalidResponse(format!(
                "embedding has {} dimensions, expected {}",
                values.len(),
                self.embedding_dimension
            )));
        }

        Ok(values)
    }

    fn dimension(&self) -> usize {
        self.embedding_dimension
    }
}

/// Pull the completed text out of a generation response.
fn extract_text(response: GenerateContentResponse) -> Result<String, ProviderError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates in response".into());
        return Err(ProviderError::InvalidResponse(reason));
    };

    let text: String = candidate
        .content
        .map(|c| {
            c.parts
                .into_iter()
                .map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.is_empty() {
        let reason = candidate
            .finish_reason
            .unwrap_or_else(|| "empty candidate".into());
        return Err(ProviderError::InvalidResponse(format!(
            "candidate has no text (finish reason: {reason})"
        )));
    }

    Ok(text)
}

// --- Gemini API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ApiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<ApiContent>,
    generation_config: ApiGenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiGenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<ApiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCandidate {
    #[serde(default)]
    content: Option<ApiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest {
    content: ApiContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_dimensionality: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: ApiEmbedding,
}

#[derive(Debug, Deserialize)]
struct ApiEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}
