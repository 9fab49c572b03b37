//! # Campanile Core
//!
//! Domain types, traits, and error definitions for the Campanile
//! question-answering runtime. This crate has **zero framework
//! dependencies** — it defines the domain model that all other crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (generation, embedding, vector corpus,
//! directory store) and every handler variant is defined as a trait here.
//! Implementations live in their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod chunk;
pub mod corpus;
pub mod directory;
pub mod error;
pub mod handler;
pub mod provider;
pub mod session;

// Re-export key types at crate root for ergonomics
pub use chunk::{Citation, ChunkMetadata, DocumentChunk, RetrievalOutcome, RetrievalResult};
pub use corpus::VectorCorpus;
pub use directory::{DirectoryQuery, DirectoryRow, DirectoryStore};
pub use error::{Error, Result};
pub use handler::{AgentHandler, AgentResponse, ConversationContext, Intent};
pub use provider::{EmbeddingProvider, GenerationProvider, GenerationRequest};
pub use session::{Role, Session, SessionId, Turn, TurnRole};
