//! Context storage backends.
//!
//! The engine talks to storage through a narrow asynchronous key/value
//! contract: one load at turn start, one store at turn end. Backends
//! persist [`ContextSnapshot`]s — the transient framework data never
//! crosses this boundary.

use crate::context::{Context, ContextSnapshot};
use crate::errors::StorageError;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Asynchronous key/value storage for conversation contexts.
#[async_trait]
pub trait ContextStorage: Send + Sync {
    /// Loads the context stored under `ctx_id`, if any.
    async fn get(&self, ctx_id: &str) -> Result<Option<Context>, StorageError>;

    /// Persists the context under `ctx_id`, replacing any previous value.
    async fn set(&self, ctx_id: &str, ctx: &Context) -> Result<(), StorageError>;
}

/// In-memory context storage without a file backend.
///
/// The default storage for tests and short-lived deployments.
#[derive(Debug, Default)]
pub struct MemoryContextStorage {
    contexts: RwLock<HashMap<String, ContextSnapshot>>,
}

impl MemoryContextStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored conversations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contexts.read().len()
    }

    /// Returns true if nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contexts.read().is_empty()
    }
}

#[async_trait]
impl ContextStorage for MemoryContextStorage {
    async fn get(&self, ctx_id: &str) -> Result<Option<Context>, StorageError> {
        Ok(self
            .contexts
            .read()
            .get(ctx_id)
            .cloned()
            .map(Context::from_snapshot))
    }

    async fn set(&self, ctx_id: &str, ctx: &Context) -> Result<(), StorageError> {
        self.contexts
            .write()
            .insert(ctx_id.to_string(), ctx.snapshot());
        Ok(())
    }
}
