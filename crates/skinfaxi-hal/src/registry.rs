//! Executor registry.
//!
//! The [`ExecutorRegistry`] is the fixed name→engine map supplied at
//! startup. It is immutable once handed to the gateway, so reads need no
//! locking. Unlike a discovery mechanism, registration is explicit: the
//! process decides at startup exactly which engines exist.
//!
//! Insertion order is preserved and observable — virtual backend
//! enumeration nests the registry order inside the catalog order.

use std::sync::Arc;

use tracing::debug;

use crate::error::{HalError, HalResult};
use crate::executor::Executor;

/// Immutable, insertion-ordered mapping from engine name to engine.
#[derive(Default)]
pub struct ExecutorRegistry {
    entries: Vec<Arc<dyn Executor>>,
}

impl ExecutorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register an engine under its own [`Executor::name`].
    ///
    /// Rejects names containing `@` and duplicate names.
    pub fn register(&mut self, executor: Arc<dyn Executor>) -> HalResult<()> {
        let name = executor.name().to_string();
        if name.contains('@') {
            return Err(HalError::ReservedSeparator(name));
        }
        if self.has_executor(&name) {
            return Err(HalError::DuplicateExecutor(name));
        }
        debug!("registering executor: {}", name);
        self.entries.push(executor);
        Ok(())
    }

    /// Look up an engine by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Executor>> {
        self.entries
            .iter()
            .find(|e| e.name() == name)
            .map(Arc::clone)
    }

    /// Check if an engine is registered.
    pub fn has_executor(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name() == name)
    }

    /// Engine names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name()).collect()
    }

    /// Number of registered engines.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
