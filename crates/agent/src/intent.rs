//! Intent classification — keyword rules first, model fallback second.
//!
//! Classification is fail-open: any unrecognized classifier reply or
//! provider failure maps to `Intent::Qa`, never to an error. The greeting
//! check is exposed separately so the orchestrator can short-circuit small
//! talk before the cache probe.

use campanile_core::handler::Intent;
use campanile_core::provider::{GenerationProvider, GenerationRequest};
use std::sync::Arc;
use tracing::{debug, warn};

/// Bare greetings and small talk that skip the whole pipeline.
const GREETINGS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "yo",
    "bonjour",
    "salut",
    "salam",
    "bonsoir",
    "good morning",
    "good afternoon",
    "good evening",
    "how are you",
    "whats up",
    "what's up",
    "thanks",
    "thank you",
    "merci",
    "bye",
    "goodbye",
    "au revoir",
];

/// Queries that are unambiguously administrative lookups.
const ADMIN_KEYWORDS: &[&str] = &[
    "student data",
    "system metric",
    "all users",
    "manage document",
    "how many users",
    "user count",
    "statistics",
    "recent conversations",
];

/// Queries that are unambiguously email-drafting requests.
const EMAIL_KEYWORDS: &[&str] = &[
    "email",
    "write a letter",
    "attestation",
    "certificate",
    "transcript",
    "recommendation letter",
    "complaint",
    "internship",
    "leave request",
];

/// True for bare greetings and pleasantries, after stripping trailing
/// punctuation and collapsing whitespace.
pub fn is_greeting(query: &str) -> bool {
    let normalized = query
        .trim()
        .trim_end_matches(['!', '?', '.', ' '])
        .to_lowercase();
    let collapsed = normalized.split_whitespace().collect::<Vec<_>>().join(" ");
    GREETINGS.contains(&collapsed.as_str())
}

/// Classifies queries into the closed intent set.
pub struct IntentClassifier {
    generator: Arc<dyn GenerationProvider>,
    model: String,
}

impl IntentClassifier {
    pub fn new(generator: Arc<dyn GenerationProvider>, model: impl Into<String>) -> Self {
        Self {
            generator,
            model: model.into(),
        }
    }

    /// Classify one query. Keyword rules avoid a model call for the
    /// obvious cases; everything else asks the model for a single word.
    pub async fn classify(&self, query: &str) -> Intent {
        if let Some(intent) = keyword_intent(query) {
            debug!(intent = %intent, "Intent matched by keyword rule");
            return intent;
        }

        let prompt = format!(
            "Classify the following user query into one of these categories:\n\
             - qa: questions about university policies, procedures, academics, administration\n\
             - admin: administrative queries about student data or system statistics (staff only)\n\
             - email: requests to draft or generate an administrative email or letter\n\
             \n\
             Query: \"{}\"\n\
             \n\
             Respond with ONLY the category name (qa, admin, or email):",
            query.trim()
        );
        let request = GenerationRequest::new(&self.model, prompt).with_temperature(0.1);

        match self.generator.complete(request).await {
            Ok(reply) => Intent::parse(&reply).unwrap_or_else(|| {
                debug!(reply = %reply.trim(), "Unrecognized classifier reply, defaulting to qa");
                Intent::Qa
            }),
            Err(e) => {
                warn!(error = %e, "Intent classification failed, defaulting to qa");
                Intent::Qa
            }
        }
    }
}

fn keyword_intent(query: &str) -> Option<Intent> {
    let q = query.to_lowercase();
    if ADMIN_KEYWORDS.iter().any(|kw| q.contains(kw)) {
        return Some(Intent::Admin);
    }
    if EMAIL_KEYWORDS.iter().any(|kw| q.contains(kw)) {
        return Some(Intent::Email);
    }
    None
}
