//! Document chunks and retrieval results.
//!
//! Chunks are produced by the offline ingestion pipeline (external) and are
//! immutable once loaded; the retrieval engine references them, never edits
//! them. A `RetrievalResult` is transient — produced per query, never
//! persisted.

use serde::{Deserialize, Serialize};

/// Provenance of a chunk within its source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Source document identifier (typically the filename).
    pub document_id: String,

    /// Page number, when the source format has pages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    /// Position of this chunk within the document's chunk sequence.
    pub chunk_index: u32,
}

/// A bounded-size excerpt of a source document, the unit of retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: String,
    pub text: String,
    /// Fixed-dimension embedding produced at ingestion time.
    pub embedding: Vec<f32>,
    pub metadata: ChunkMetadata,
}

/// A chunk paired with its similarity score for one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub chunk: DocumentChunk,
    /// Cosine similarity against the query embedding, in [-1, 1].
    pub score: f32,
}

/// The outcome of a retrieval pass.
///
/// The two empty outcomes are deliberately distinct: an empty corpus routes
/// to a clarifying no-corpus response, while a populated corpus with no
/// match above the threshold routes to a no-context answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RetrievalOutcome {
    /// The corpus has zero chunks ingested.
    EmptyCorpus,
    /// The corpus has chunks, but none passed the similarity threshold.
    NoMatches,
    /// At least one chunk passed the threshold, ordered by descending score.
    Results(Vec<RetrievalResult>),
}

impl RetrievalOutcome {
    /// The ranked results, or an empty slice for either empty outcome.
    pub fn results(&self) -> &[RetrievalResult] {
        match self {
            Self::Results(results) => results,
            _ => &[],
        }
    }

    pub fn is_empty_corpus(&self) -> bool {
        matches!(self, Self::EmptyCorpus)
    }
}

/// A reference from an answer back to the chunk that grounded it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub chunk_id: String,
    pub document_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    pub score: f32,
}

impl From<&RetrievalResult> for Citation {
    fn from(result: &RetrievalResult) -> Self {
        Self {
            chunk_id: result.chunk.id.clone(),
            document_id: result.chunk.metadata.document_id.clone(),
            page: result.chunk.metadata.page,
            score: result.score,
        }
    }
}
