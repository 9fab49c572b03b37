//! The handler implementations behind the orchestrator's intent registry.

pub mod admin;
pub mod email;
pub mod qa;

pub use admin::AdminHandler;
pub use email::{EmailHandler, EmailKind};
pub use qa::QaHandler;
