//! Conversation memory for Campanile.
//!
//! Live session windows are in-memory and bounded; the optional SQLite
//! archive keeps a durable record of completed exchanges for admin
//! reporting.

pub mod directory;
pub mod store;

#[cfg(feature = "sqlite")]
pub mod archive;

pub use directory::MemoryDirectory;
pub use store::SessionManager;

#[cfg(feature = "sqlite")]
pub use archive::{ArchivedExchange, ConversationArchive};
