//! The request pipeline.
//!
//! One `handle` call walks the fixed stages: greeting fast path, FAQ cache
//! probe, intent classification, role gate, handler dispatch, cache fill,
//! then memory and archive recording. Per-request failures degrade into an
//! apologetic `AgentResponse`; `handle` itself never fails.

use campanile_cache::FaqCache;
use campanile_core::handler::{AgentResponse, ConversationContext, Intent};
use campanile_core::provider::EmbeddingProvider;
use campanile_core::session::{Session, SessionId, Turn};
use campanile_memory::archive::{ArchivedExchange, ConversationArchive};
use campanile_memory::SessionManager;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::intent::{is_greeting, IntentClassifier};
use crate::registry::HandlerRegistry;

const GREETING_RESPONSE: &str = "Hello! I'm the university assistant. I can answer questions \
about policies, procedures and student services, or help you draft administrative emails. \
What can I do for you?";

const SESSION_EXPIRED: &str = "Your session has expired. Please start a new session.";

const DEGRADED_APOLOGY: &str = "I'm sorry, I ran into a problem while preparing your answer. \
Please try again in a moment.";

pub struct Orchestrator {
    registry: HandlerRegistry,
    classifier: IntentClassifier,
    cache: Arc<FaqCache>,
    sessions: Arc<SessionManager>,
    embedder: Arc<dyn EmbeddingProvider>,
    memory_window: usize,
    archive: Option<Arc<ConversationArchive>>,
}

impl Orchestrator {
    pub fn new(
        registry: HandlerRegistry,
        classifier: IntentClassifier,
        cache: Arc<FaqCache>,
        sessions: Arc<SessionManager>,
        embedder: Arc<dyn EmbeddingProvider>,
        memory_window: usize,
    ) -> Self {
        Self {
            registry,
            classifier,
            cache,
            sessions,
            embedder,
            memory_window,
            archive: None,
        }
    }

    /// Also record every exchange to the conversation archive.
    pub fn with_archive(mut self, archive: Arc<ConversationArchive>) -> Self {
        self.archive = Some(archive);
        self
    }

    /// Process one user query. Always returns a response; failures along
    /// the way degrade rather than propagate.
    pub async fn handle(&self, query: &str, session_id: &SessionId) -> AgentResponse {
        let Some(session) = self.sessions.get(session_id).await else {
            info!(session = %session_id, "Request against a missing or expired session");
            return AgentResponse::degraded(Intent::Qa, SESSION_EXPIRED);
        };

        let response = self.dispatch(query, &session, session_id).await;
        self.record(query, &response, session_id).await;
        response
    }

    async fn dispatch(
        &self,
        query: &str,
        session: &Session,
        session_id: &SessionId,
    ) -> AgentResponse {
        if is_greeting(query) {
            debug!("Greeting fast path");
            return AgentResponse::new(Intent::Qa, GREETING_RESPONSE);
        }

        // One embedding serves both the cache probe and retrieval. Losing
        // it costs the cache and forces QA to re-embed, nothing more.
        let fingerprint = match self.embedder.embed(query).await {
            Ok(embedding) => Some(embedding),
            Err(err) => {
                warn!(error = %err, "Query embedding failed, skipping the cache probe");
                None
            }
        };

        if let Some(fp) = &fingerprint {
            if let Some(hit) = self.cache.lookup(fp).await {
                info!(similarity = hit.similarity, "Answering from the FAQ cache");
                return AgentResponse::from_cache(hit.answer, hit.citations);
            }
        }

        let mut intent = self.classifier.classify(query).await;
        if intent == Intent::Admin && !session.role.can_query_directory() {
            info!(user = %session.user, role = %session.role, "Downgrading admin intent to qa");
            intent = Intent::Qa;
        }

        let recent = self
            .sessions
            .recent(session_id, self.memory_window)
            .await
            .unwrap_or_default();
        let mut context = ConversationContext::new(recent);
        if let Some(fp) = fingerprint.clone() {
            context = context.with_embedding(fp);
        }

        let Some(handler) = self.registry.get(intent) else {
            warn!(%intent, "No handler registered for intent");
            return AgentResponse::degraded(intent, DEGRADED_APOLOGY);
        };

        let response = match handler.invoke(query, &context, session).await {
            Ok(response) => response,
            Err(err) => {
                warn!(%intent, error = %err, "Handler failed, degrading");
                AgentResponse::degraded(intent, DEGRADED_APOLOGY)
            }
        };

        if response.is_cacheable() {
            if let Some(fp) = fingerprint {
                self.cache
                    .insert(query, fp, response.text.clone(), response.citations.clone())
                    .await;
            }
        }

        response
    }

    /// Memory and archive writes happen for every response, cached or
    /// degraded included. Neither failure reaches the caller.
    async fn record(&self, query: &str, response: &AgentResponse, session_id: &SessionId) {
        if let Err(err) = self.sessions.append(session_id, Turn::user(query)).await {
            warn!(error = %err, "Failed to append the user turn");
        }
        if let Err(err) = self
            .sessions
            .append(session_id, Turn::assistant(&response.text))
            .await
        {
            warn!(error = %err, "Failed to append the assistant turn");
        }

        if let Some(archive) = &self.archive {
            let exchange = ArchivedExchange {
                session_id: session_id.to_string(),
                question: query.to_string(),
                answer: response.text.clone(),
                handler: response.handler.to_string(),
                cached: response.cached,
                citation_count: response.citations.len() as u32,
                created_at: Utc::now(),
            };
            if let Err(err) = archive.record(&exchange).await {
                warn!(error = %err, "Failed to archive the exchange");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{AdminHandler, EmailHandler, QaHandler};
    use crate::test_helpers::{KeywordEmbedder, ScriptedGenerator};
    use campanile_core::chunk::{ChunkMetadata, DocumentChunk};
    use campanile_core::error::ProviderError;
    use campanile_core::session::Role;
    use campanile_core::VectorCorpus;
    use campanile_memory::MemoryDirectory;
    use campanile_retrieval::{InMemoryCorpus, RetrievalEngine};
    use chrono::Duration;

    const MODEL: &str = "gemini-2.5-flash";

    struct World {
        orchestrator: Orchestrator,
        sessions: Arc<SessionManager>,
        cache: Arc<FaqCache>,
        embedder: Arc<KeywordEmbedder>,
        classify_gen: Arc<ScriptedGenerator>,
        qa_gen: Arc<ScriptedGenerator>,
    }

    fn library_chunk() -> DocumentChunk {
        DocumentChunk {
            id: "c1".into(),
            text: "The library opens at 8am on weekdays and 10am on weekends.".into(),
            embedding: vec![1.0, 0.0, 0.0],
            metadata: ChunkMetadata {
                document_id: "handbook.pdf".into(),
                page: Some(12),
                chunk_index: 0,
            },
        }
    }

    async fn world(
        classify_replies: Vec<Result<String, ProviderError>>,
        qa_replies: Vec<Result<String, ProviderError>>,
        chunks: Vec<DocumentChunk>,
    ) -> World {
        let sessions = Arc::new(SessionManager::new(10, Duration::minutes(60)));
        let cache = Arc::new(FaqCache::new(100, 0.92, Duration::hours(24)));
        let embedder = Arc::new(
            KeywordEmbedder::new(vec![("library", vec![1.0, 0.0, 0.0])])
                .with_fallback(vec![0.0, 0.0, 1.0]),
        );

        let corpus = Arc::new(InMemoryCorpus::new());
        for chunk in chunks {
            corpus.upsert(chunk).await.unwrap();
        }
        let engine = Arc::new(RetrievalEngine::new(embedder.clone(), corpus, 5, 0.7));

        let classify_gen = Arc::new(ScriptedGenerator::new(classify_replies));
        let qa_gen = Arc::new(ScriptedGenerator::new(qa_replies));

        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(QaHandler::new(
            engine,
            qa_gen.clone(),
            MODEL,
            0.3,
            1024,
            8000,
        )));
        registry.register(Arc::new(AdminHandler::new(Arc::new(MemoryDirectory::new(
            sessions.clone(),
        )))));
        registry.register(Arc::new(EmailHandler::new(
            Arc::new(ScriptedGenerator::new(vec![])),
            MODEL,
            0.3,
            1024,
        )));

        let orchestrator = Orchestrator::new(
            registry,
            IntentClassifier::new(classify_gen.clone(), MODEL),
            cache.clone(),
            sessions.clone(),
            embedder.clone(),
            10,
        );

        World {
            orchestrator,
            sessions,
            cache,
            embedder,
            classify_gen,
            qa_gen,
        }
    }

    #[tokio::test]
    async fn greeting_short_circuits_the_pipeline() {
        let w = world(vec![], vec![], vec![]).await;
        let session = w.sessions.create_session("amina", Role::Student).await;

        let response = w.orchestrator.handle("Hello!", &session.id).await;

        assert_eq!(response.text, GREETING_RESPONSE);
        assert_eq!(response.handler, Intent::Qa);
        assert!(!response.error);
        assert_eq!(w.embedder.call_count(), 0);
        assert_eq!(w.classify_gen.call_count(), 0);

        // The exchange still lands in session memory.
        let turns = w.sessions.recent(&session.id, 10).await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].content, "Hello!");
    }

    #[tokio::test]
    async fn repeat_question_is_served_from_the_cache() {
        let w = world(
            vec![Ok("qa".into())],
            vec![Ok("The library opens at 8am.".into())],
            vec![library_chunk()],
        )
        .await;
        let session = w.sessions.create_session("amina", Role::Student).await;

        let first = w
            .orchestrator
            .handle("What are the library hours?", &session.id)
            .await;
        assert!(!first.cached);
        assert_eq!(first.citations.len(), 1);
        assert_eq!(w.embedder.call_count(), 1);

        let second = w
            .orchestrator
            .handle("What are the library hours?", &session.id)
            .await;
        assert!(second.cached);
        assert_eq!(second.text, first.text);
        assert_eq!(second.citations.len(), 1);

        // One classification and one answer total; the repeat cost only
        // the probe embedding.
        assert_eq!(w.classify_gen.call_count(), 1);
        assert_eq!(w.qa_gen.call_count(), 1);
        assert_eq!(w.embedder.call_count(), 2);

        let turns = w.sessions.recent(&session.id, 10).await.unwrap();
        assert_eq!(turns.len(), 4);
    }

    #[tokio::test]
    async fn empty_corpus_answers_from_template() {
        let w = world(vec![Ok("qa".into())], vec![], vec![]).await;
        let session = w.sessions.create_session("amina", Role::Student).await;

        let response = w
            .orchestrator
            .handle("What are the library hours?", &session.id)
            .await;

        assert!(response.text.contains("No university documents have been loaded"));
        assert!(!response.error);
        assert_eq!(w.qa_gen.call_count(), 0);
        assert_eq!(w.cache.stats().await.size, 0);
    }

    #[tokio::test]
    async fn classifier_failure_falls_open_to_qa() {
        let w = world(
            vec![Err(ProviderError::Timeout("generateContent".into()))],
            vec![Ok("The library opens at 8am.".into())],
            vec![library_chunk()],
        )
        .await;
        let session = w.sessions.create_session("amina", Role::Student).await;

        let response = w
            .orchestrator
            .handle("What are the library hours?", &session.id)
            .await;

        assert_eq!(response.handler, Intent::Qa);
        assert!(!response.error);
        assert_eq!(response.text, "The library opens at 8am.");
    }

    #[tokio::test]
    async fn admin_intent_downgrades_for_students() {
        // "statistics" routes by keyword; no classifier call happens.
        let w = world(vec![], vec![], vec![library_chunk()]).await;
        let session = w.sessions.create_session("amina", Role::Student).await;

        let response = w
            .orchestrator
            .handle("Show me the system statistics", &session.id)
            .await;

        assert_eq!(response.handler, Intent::Qa);
        assert!(response.text.contains("couldn't find specific information"));
        assert_eq!(w.classify_gen.call_count(), 0);
        assert_eq!(w.qa_gen.call_count(), 0);
    }

    #[tokio::test]
    async fn admin_role_reaches_the_directory() {
        let w = world(vec![], vec![], vec![]).await;
        let session = w.sessions.create_session("director", Role::Admin).await;

        let response = w
            .orchestrator
            .handle("How many users are registered?", &session.id)
            .await;

        assert_eq!(response.handler, Intent::Admin);
        assert_eq!(response.text, "user_count: 1");
        assert!(!response.is_cacheable());
    }

    #[tokio::test]
    async fn handler_failure_degrades_gracefully() {
        let w = world(
            vec![Ok("qa".into())],
            vec![Err(ProviderError::Timeout("generateContent".into()))],
            vec![library_chunk()],
        )
        .await;
        let session = w.sessions.create_session("amina", Role::Student).await;

        let response = w
            .orchestrator
            .handle("What are the library hours?", &session.id)
            .await;

        assert!(response.error);
        assert_eq!(response.text, DEGRADED_APOLOGY);
        assert_eq!(w.cache.stats().await.size, 0);

        // Degraded exchanges are still remembered.
        let turns = w.sessions.recent(&session.id, 10).await.unwrap();
        assert_eq!(turns.len(), 2);
    }

    #[tokio::test]
    async fn unknown_session_is_rejected() {
        let w = world(vec![], vec![], vec![]).await;

        let response = w.orchestrator.handle("Hello!", &SessionId::new()).await;

        assert!(response.error);
        assert_eq!(response.text, SESSION_EXPIRED);
    }

    #[tokio::test]
    async fn archive_records_every_exchange() {
        let w = world(vec![], vec![], vec![]).await;
        let archive = Arc::new(ConversationArchive::new("sqlite::memory:").await.unwrap());
        let orchestrator = w.orchestrator.with_archive(archive.clone());

        let session = w.sessions.create_session("amina", Role::Student).await;
        orchestrator.handle("Hello!", &session.id).await;

        assert_eq!(archive.count().await.unwrap(), 1);
        let recorded = archive.recent(1).await.unwrap();
        assert_eq!(recorded[0].question, "Hello!");
        assert_eq!(recorded[0].handler, "qa");
        assert!(!recorded[0].cached);
        assert_eq!(recorded[0].session_id, session.id.to_string());
    }
}
