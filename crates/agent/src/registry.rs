//! Intent-keyed handler registry.

use campanile_core::handler::{AgentHandler, Intent};
use std::collections::HashMap;
use std::sync::Arc;

/// Maps each intent to the handler that serves it.
///
/// Registration is keyed by the handler's own `kind()`; registering a
/// second handler for the same intent replaces the first.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<Intent, Arc<dyn AgentHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Arc<dyn AgentHandler>) {
        self.handlers.insert(handler.kind(), handler);
    }

    pub fn get(&self, intent: Intent) -> Option<Arc<dyn AgentHandler>> {
        self.handlers.get(&intent).cloned()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
