//! In-memory corpus backend — chunks loaded from ingestion output.

use async_trait::async_trait;
use campanile_core::chunk::{DocumentChunk, RetrievalResult};
use campanile_core::corpus::VectorCorpus;
use campanile_core::error::RetrievalError;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::vector::rank_chunks;

/// An in-memory corpus that stores chunks in a Vec.
///
/// Insertion order is preserved: equal-similarity ties in query results
/// resolve to earlier-ingested chunks.
pub struct InMemoryCorpus {
    chunks: Arc<RwLock<Vec<DocumentChunk>>>,
}

impl InMemoryCorpus {
    pub fn new() -> Self {
        Self {
            chunks: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Load pre-embedded chunks from a JSONL file (one chunk per line).
    ///
    /// Returns the number of chunks loaded. Blank lines are skipped;
    /// a malformed line fails the whole load.
    pub async fn load_jsonl(&self, path: &Path) -> Result<usize, RetrievalError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RetrievalError::Unavailable(format!("cannot read corpus file {}: {e}", path.display()))
        })?;

        let mut loaded = 0;
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let chunk: DocumentChunk = serde_json::from_str(line).map_err(|e| {
                RetrievalError::Unavailable(format!(
                    "malformed chunk at {}:{}: {e}",
                    path.display(),
                    line_no + 1
                ))
            })?;
            self.upsert(chunk).await?;
            loaded += 1;
        }

        info!(path = %path.display(), loaded, "Loaded corpus");
        Ok(loaded)
    }
}

impl Default for InMemoryCorpus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorCorpus for InMemoryCorpus {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn upsert(&self, chunk: DocumentChunk) -> std::result::Result<(), RetrievalError> {
        let mut chunks = self.chunks.write().await;
        // Replacing in place keeps the original ingestion position
        match chunks.iter().position(|c| c.id == chunk.id) {
            Some(i) => chunks[i] = chunk,
            None => chunks.push(chunk),
        }
        Ok(())
    }

    async fn query(
        &self,
        embedding: &[f32],
        top_k: usize,
    ) -> std::result::Result<Vec<RetrievalResult>, RetrievalError> {
        let chunks = self.chunks.read().await;
        Ok(rank_chunks(&chunks, embedding, top_k))
    }

    async fn count(&self) -> std::result::Result<usize, RetrievalError> {
        Ok(self.chunks.read().await.len())
    }
}
