//! Agent handler contract — the shared capability behind the orchestrator.
//!
//! Handlers are a closed set of variants {QA, Admin, Email} behind one
//! `invoke` signature; the orchestrator selects exactly one per request via
//! an intent registry. Variants are intentionally thin: only the shared
//! contract matters to routing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::chunk::Citation;
use crate::error::Result;
use crate::session::{Session, Turn};

/// The closed intent set the orchestrator routes over.
///
/// Also identifies which handler produced an `AgentResponse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Qa,
    Admin,
    Email,
}

impl Intent {
    /// Parse a classifier reply. Anything unrecognized is `None`; the
    /// orchestrator treats that as a classification failure and falls open
    /// to QA.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "qa" => Some(Self::Qa),
            "admin" => Some(Self::Admin),
            "email" => Some(Self::Email),
            _ => None,
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Intent::Qa => "qa",
            Intent::Admin => "admin",
            Intent::Email => "email",
        };
        write!(f, "{s}")
    }
}

/// What the orchestrator hands every handler alongside the query: the
/// session's recent turns (most recent last, as stored) and the query
/// embedding when it was already computed for the cache probe.
#[derive(Debug, Clone, Default)]
pub struct ConversationContext {
    pub recent_turns: Vec<Turn>,
    pub query_embedding: Option<Vec<f32>>,
}

impl ConversationContext {
    pub fn new(recent_turns: Vec<Turn>) -> Self {
        Self {
            recent_turns,
            query_embedding: None,
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.query_embedding = Some(embedding);
        self
    }
}

/// The final product of one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    /// The answer text shown to the user.
    pub text: String,

    /// Chunk references that grounded the answer (QA only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<Citation>,

    /// Which handler produced this response.
    pub handler: Intent,

    /// Set when the response is a degraded substitute for a failed path.
    #[serde(default)]
    pub error: bool,

    /// Set when the answer was served from the FAQ cache.
    #[serde(default)]
    pub cached: bool,
}

impl AgentResponse {
    pub fn new(handler: Intent, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            citations: Vec::new(),
            handler,
            error: false,
            cached: false,
        }
    }

    /// A degraded response standing in for a failed path; never an `Err`.
    pub fn degraded(handler: Intent, text: impl Into<String>) -> Self {
        Self {
            error: true,
            ..Self::new(handler, text)
        }
    }

    pub fn with_citations(mut self, citations: Vec<Citation>) -> Self {
        self.citations = citations;
        self
    }

    pub fn from_cache(text: impl Into<String>, citations: Vec<Citation>) -> Self {
        Self {
            cached: true,
            ..Self::new(Intent::Qa, text).with_citations(citations)
        }
    }

    /// Grounded QA answers are the only cacheable responses: Admin and
    /// Email output is identity- or template-specific.
    pub fn is_cacheable(&self) -> bool {
        self.handler == Intent::Qa && !self.error && !self.cached && !self.citations.is_empty()
    }
}

/// The shared handler capability.
#[async_trait]
pub trait AgentHandler: Send + Sync {
    /// Which intent this handler serves.
    fn kind(&self) -> Intent;

    /// Process one query within a session.
    ///
    /// An `Err` here is recovered by the orchestrator into a degraded
    /// `AgentResponse`; it never reaches the caller as a failure.
    async fn invoke(
        &self,
        query: &str,
        context: &ConversationContext,
        session: &Session,
    ) -> Result<AgentResponse>;
}
