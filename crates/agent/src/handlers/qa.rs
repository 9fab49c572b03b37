//! Grounded question answering over the document corpus.
//!
//! The handler retrieves relevant chunks, assembles a bounded prompt and
//! asks the generation provider for an answer. When retrieval comes back
//! empty it answers from a template without spending a generation call.

use async_trait::async_trait;
use campanile_core::chunk::{Citation, RetrievalOutcome};
use campanile_core::error::Result;
use campanile_core::handler::{AgentHandler, AgentResponse, ConversationContext, Intent};
use campanile_core::provider::{GenerationProvider, GenerationRequest};
use campanile_core::session::Session;
use campanile_retrieval::RetrievalEngine;
use std::sync::Arc;
use tracing::{debug, info};

use crate::context::ContextAssembler;

/// Instructions prefixed to every grounded generation call.
const SYSTEM_PROMPT: &str = "You are an expert administrative assistant for a university. \
Answer the question using ONLY the reference passages provided below.\n\
\n\
Rules:\n\
- Base every statement on the provided references; never invent policies, dates or fees.\n\
- If the references do not fully answer the question, say what is missing and suggest \
contacting the relevant administrative office.\n\
- Present procedures as numbered steps and state deadlines explicitly.\n\
- Keep the tone professional and concise.";

/// Answer when no documents have been ingested at all.
const EMPTY_CORPUS_RESPONSE: &str = "No university documents have been loaded yet, so I have \
nothing to search. Please ask an administrator to ingest the document corpus, then try again.";

pub struct QaHandler {
    engine: Arc<RetrievalEngine>,
    generator: Arc<dyn GenerationProvider>,
    assembler: ContextAssembler,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
}

impl QaHandler {
    pub fn new(
        engine: Arc<RetrievalEngine>,
        generator: Arc<dyn GenerationProvider>,
        model: impl Into<String>,
        temperature: f32,
        max_output_tokens: u32,
        max_context_chars: usize,
    ) -> Self {
        Self {
            engine,
            generator,
            assembler: ContextAssembler::new(max_context_chars),
            model: model.into(),
            temperature,
            max_output_tokens,
        }
    }

    /// Answer when the corpus has content but nothing cleared the threshold.
    fn no_context_response(query: &str) -> String {
        format!(
            "I apologize, but I couldn't find specific information about \"{query}\" in our \
             university documents.\n\n\
             Here are some suggestions:\n\
             1. Try rephrasing your question with different keywords\n\
             2. Contact the relevant administrative office directly\n\
             3. Check the university website for the most up-to-date information\n\n\
             Is there something else I can help you with?"
        )
    }
}

#[async_trait]
impl AgentHandler for QaHandler {
    fn kind(&self) -> Intent {
        Intent::Qa
    }

    async fn invoke(
        &self,
        query: &str,
        context: &ConversationContext,
        session: &Session,
    ) -> Result<AgentResponse> {
        // Reuse the fingerprint computed for the cache probe when we have it.
        let outcome = match &context.query_embedding {
            Some(embedding) => self.engine.search_with(embedding).await?,
            None => self.engine.search(query).await?,
        };

        let results = match outcome {
            RetrievalOutcome::EmptyCorpus => {
                info!(user = %session.user, "Question asked against an empty corpus");
                return Ok(AgentResponse::new(Intent::Qa, EMPTY_CORPUS_RESPONSE));
            }
            RetrievalOutcome::NoMatches => {
                debug!("No reference cleared the relevance threshold");
                return Ok(AgentResponse::new(
                    Intent::Qa,
                    Self::no_context_response(query),
                ));
            }
            RetrievalOutcome::Results(results) => results,
        };

        let assembled = self
            .assembler
            .assemble(query, &results, &context.recent_turns);
        debug!(
            chars = assembled.metadata.total_chars,
            references = results.len(),
            drops = assembled.metadata.drops.len(),
            "Context assembled"
        );

        let request = GenerationRequest::new(
            &self.model,
            format!("{SYSTEM_PROMPT}\n\n{}", assembled.prompt),
        )
        .with_temperature(self.temperature)
        .with_max_output_tokens(self.max_output_tokens);
        let answer = self.generator.complete(request).await?;

        let citations: Vec<Citation> = results.iter().map(Citation::from).collect();
        Ok(AgentResponse::new(Intent::Qa, answer).with_citations(citations))
    }
}
