//! Retrieval for Campanile — embedding search over the document corpus.
//!
//! The corpus holds pre-embedded chunks produced by offline ingestion.
//! Backends implement `campanile_core::VectorCorpus`; the engine layers
//! query embedding and threshold filtering on top.

pub mod corpus;
pub mod engine;
pub mod vector;

pub use corpus::InMemoryCorpus;
pub use engine::RetrievalEngine;
pub use vector::cosine_similarity;
