//! Bounded context assembly for generation calls.
//!
//! One text block per request, built from the query, retrieved references
//! and recent conversation turns, under a hard character budget with
//! priority-based trimming and drop tracking.

pub mod assembler;

pub use assembler::{
    AssembledContext, AssemblyMetadata, ContextAssembler, DropInfo, SectionStats,
};
