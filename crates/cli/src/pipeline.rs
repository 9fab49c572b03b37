//! Wiring from configuration to a ready orchestrator.

use campanile_agents::{
    AdminHandler, EmailHandler, HandlerRegistry, IntentClassifier, Orchestrator, QaHandler,
};
use campanile_cache::FaqCache;
use campanile_config::AppConfig;
use campanile_memory::archive::ConversationArchive;
use campanile_memory::{MemoryDirectory, SessionManager};
use campanile_retrieval::{InMemoryCorpus, RetrievalEngine};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub struct Pipeline {
    pub orchestrator: Orchestrator,
    pub sessions: Arc<SessionManager>,
    pub cache: Arc<FaqCache>,
    pub corpus_chunks: usize,
}

/// Fail with setup instructions when no API key is configured.
pub fn ensure_api_key(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.has_api_key() {
        return Ok(());
    }

    eprintln!();
    eprintln!("  ERROR: No API key configured!");
    eprintln!();
    eprintln!("  Set one of these environment variables:");
    eprintln!("    CAMPANILE_API_KEY = '...'");
    eprintln!("    GEMINI_API_KEY    = '...'");
    eprintln!();
    eprintln!("  Or add it to your config file:");
    eprintln!(
        "    {}",
        AppConfig::config_dir().join("config.toml").display()
    );
    eprintln!();
    Err("No API key found. See above for setup instructions.".into())
}

/// Build the full request pipeline from configuration, optionally loading
/// a corpus file into the in-memory backend.
pub async fn build(
    config: &AppConfig,
    corpus_path: Option<&Path>,
) -> Result<Pipeline, Box<dyn std::error::Error>> {
    let (generation, embedding) = campanile_providers::build_providers(config)?;

    let corpus = Arc::new(InMemoryCorpus::new());
    let corpus_chunks = match corpus_path {
        Some(path) => corpus.load_jsonl(path).await?,
        None => 0,
    };

    let engine = Arc::new(RetrievalEngine::new(
        embedding.clone(),
        corpus,
        config.retrieval.top_k,
        config.retrieval.similarity_threshold,
    ));

    let sessions = Arc::new(SessionManager::new(
        config.memory.window,
        chrono::Duration::minutes(config.memory.session_timeout_minutes as i64),
    ));
    let cache = Arc::new(FaqCache::new(
        config.cache.capacity,
        config.cache.similarity_threshold,
        chrono::Duration::hours(config.cache.ttl_hours as i64),
    ));

    let archive = match &config.memory.archive_path {
        Some(path) => Some(Arc::new(ConversationArchive::new(path).await?)),
        None => None,
    };

    let mut directory = MemoryDirectory::new(sessions.clone());
    if let Some(archive) = &archive {
        directory = directory.with_archive(archive.clone());
    }

    let mut registry = HandlerRegistry::new();
    registry.register(Arc::new(QaHandler::new(
        engine,
        generation.clone(),
        &config.provider.generation_model,
        config.provider.temperature,
        config.provider.max_output_tokens,
        config.context.max_context_length,
    )));
    registry.register(Arc::new(AdminHandler::new(Arc::new(directory))));
    registry.register(Arc::new(EmailHandler::new(
        generation.clone(),
        &config.provider.generation_model,
        config.provider.temperature,
        config.provider.max_output_tokens,
    )));

    let classifier = IntentClassifier::new(generation, &config.provider.generation_model);
    let mut orchestrator = Orchestrator::new(
        registry,
        classifier,
        cache.clone(),
        sessions.clone(),
        embedding,
        config.memory.window,
    );
    if let Some(archive) = archive {
        orchestrator = orchestrator.with_archive(archive);
    }

    debug!(
        corpus_chunks,
        model = %config.provider.generation_model,
        "Pipeline assembled"
    );

    Ok(Pipeline {
        orchestrator,
        sessions,
        cache,
        corpus_chunks,
    })
}
