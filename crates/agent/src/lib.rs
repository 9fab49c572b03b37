//! Intent routing and request orchestration for Campanile.
//!
//! One request walks a fixed pipeline:
//!
//! 1. **Greeting fast path** answers social openers from a template
//! 2. **FAQ cache probe** by query embedding
//! 3. **Intent classification** (keyword rules, then the model, failing
//!    open to QA)
//! 4. **Role gate** downgrades admin intent for non-staff sessions
//! 5. **Handler dispatch** over the registered {QA, Admin, Email} set
//! 6. **Recording** into session memory and the conversation archive
//!
//! Handlers can fail; the orchestrator cannot. Every failure degrades into
//! an apologetic response with the error flag set.

pub mod context;
pub mod handlers;
pub mod intent;
pub mod orchestrator;
pub mod registry;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use context::{
    AssembledContext, AssemblyMetadata, ContextAssembler, DropInfo, SectionStats,
};
pub use handlers::{AdminHandler, EmailHandler, EmailKind, QaHandler};
pub use intent::{is_greeting, IntentClassifier};
pub use orchestrator::Orchestrator;
pub use registry::HandlerRegistry;
