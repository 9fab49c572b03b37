//! The retrieval engine — embed, search, threshold.

use campanile_core::chunk::RetrievalOutcome;
use campanile_core::corpus::VectorCorpus;
use campanile_core::error::RetrievalError;
use campanile_core::provider::EmbeddingProvider;
use std::sync::Arc;
use tracing::debug;

/// Runs embedding search over a corpus and applies the relevance threshold.
///
/// The engine distinguishes "nothing ingested" from "nothing relevant":
/// downstream answers differ for the two cases.
pub struct RetrievalEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    corpus: Arc<dyn VectorCorpus>,
    top_k: usize,
    threshold: f32,
}

impl RetrievalEngine {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        corpus: Arc<dyn VectorCorpus>,
        top_k: usize,
        threshold: f32,
    ) -> Self {
        Self {
            embedder,
            corpus,
            top_k,
            threshold,
        }
    }

    /// Embed the query text and search.
    pub async fn search(&self, query: &str) -> Result<RetrievalOutcome, RetrievalError> {
        let embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(RetrievalError::Embedding)?;
        self.search_with(&embedding).await
    }

    /// Search with a precomputed query embedding (e.g. the cache fingerprint).
    pub async fn search_with(&self, embedding: &[f32]) -> Result<RetrievalOutcome, RetrievalError> {
        if self.corpus.count().await? == 0 {
            debug!(corpus = self.corpus.name(), "Corpus is empty");
            return Ok(RetrievalOutcome::EmptyCorpus);
        }

        let ranked = self.corpus.query(embedding, self.top_k).await?;
        let results: Vec<_> = ranked
            .into_iter()
            .filter(|r| r.score >= self.threshold)
            .collect();

        debug!(
            corpus = self.corpus.name(),
            results = results.len(),
            top_score = results.first().map(|r| r.score).unwrap_or(0.0),
            threshold = self.threshold,
            "Retrieval complete"
        );

        if results.is_empty() {
            Ok(RetrievalOutcome::NoMatches)
        } else {
            Ok(RetrievalOutcome::Results(results))
        }
    }

    /// Number of chunks in the underlying corpus.
    pub async fn corpus_size(&self) -> Result<usize, RetrievalError> {
        self.corpus.count().await
    }
}
