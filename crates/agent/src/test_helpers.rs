//! Shared scripted collaborators for handler and orchestrator tests.

use async_trait::async_trait;
use campanile_core::error::ProviderError;
use campanile_core::provider::{EmbeddingProvider, GenerationProvider, GenerationRequest};
use std::sync::Mutex;

/// A generation provider that replays a scripted sequence of outcomes.
///
/// Each `complete` call consumes the next entry and records the prompt it
/// was given. Panics if more calls are made than outcomes provided.
pub struct ScriptedGenerator {
    replies: Mutex<Vec<Result<String, ProviderError>>>,
    seen_prompts: Mutex<Vec<String>>,
    calls: Mutex<usize>,
}

impl ScriptedGenerator {
    pub fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            replies: Mutex::new(replies),
            seen_prompts: Mutex::new(Vec::new()),
            calls: Mutex::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.seen_prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationProvider for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: GenerationRequest) -> Result<String, ProviderError> {
        let mut calls = self.calls.lock().unwrap();
        let replies = self.replies.lock().unwrap();

        if *calls >= replies.len() {
            panic!(
                "ScriptedGenerator: no more replies (call #{}, have {})",
                *calls,
                replies.len()
            );
        }
        self.seen_prompts.lock().unwrap().push(request.prompt);
        let reply = replies[*calls].clone();
        *calls += 1;
        reply
    }
}

/// An embedding provider that routes by substring match.
///
/// The first route whose keyword occurs in the text wins; unmatched text
/// falls back to the configured default or fails with a network error.
pub struct KeywordEmbedder {
    routes: Vec<(&'static str, Vec<f32>)>,
    fallback: Option<Vec<f32>>,
    calls: Mutex<usize>,
}

impl KeywordEmbedder {
    pub fn new(routes: Vec<(&'static str, Vec<f32>)>) -> Self {
        Self {
            routes,
            fallback: None,
            calls: Mutex::new(0),
        }
    }

    pub fn with_fallback(mut self, embedding: Vec<f32>) -> Self {
        self.fallback = Some(embedding);
        self
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        *self.calls.lock().unwrap() += 1;
        let lowered = text.to_lowercase();
        for (keyword, embedding) in &self.routes {
            if lowered.contains(keyword) {
                return Ok(embedding.clone());
            }
        }
        self.fallback
            .clone()
            .ok_or_else(|| ProviderError::Network(format!("no embedding route for {text:?}")))
    }

    fn dimension(&self) -> usize {
        3
    }
}

/// An embedding provider that always fails.
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    fn name(&self) -> &str {
        "failing"
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>, ProviderError> {
        Err(ProviderError::Network("embedding service down".into()))
    }

    fn dimension(&self) -> usize {
        3
    }
}
