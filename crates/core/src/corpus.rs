//! The vector corpus — the chunk store populated by offline ingestion.
//!
//! Serving traffic treats the corpus as read-mostly: each query sees a
//! consistent snapshot as of when the search began. `upsert` exists for
//! loading ingestion output, not for concurrent mutation during serving.

use async_trait::async_trait;

use crate::chunk::{DocumentChunk, RetrievalResult};
use crate::error::RetrievalError;

#[async_trait]
pub trait VectorCorpus: Send + Sync {
    /// A human-readable name for this corpus backend.
    fn name(&self) -> &str;

    /// Insert a chunk, replacing any existing chunk with the same id.
    async fn upsert(&self, chunk: DocumentChunk) -> std::result::Result<(), RetrievalError>;

    /// Nearest-neighbor query: the `top_k` chunks ranked by cosine
    /// similarity to `embedding`, descending. No threshold is applied here;
    /// filtering belongs to the retrieval engine.
    async fn query(
        &self,
        embedding: &[f32],
        top_k: usize,
    ) -> std::result::Result<Vec<RetrievalResult>, RetrievalError>;

    /// Number of chunks currently ingested.
    async fn count(&self) -> std::result::Result<usize, RetrievalError>;
}
