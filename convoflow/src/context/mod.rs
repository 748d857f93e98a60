//! Per-conversation state shared by every component during a turn.
//!
//! This module provides:
//! - The [`Context`] itself: turn history, auxiliary data, transient
//!   framework data
//! - [`TurnHistory`], the append-only request/response/label record
//! - [`ContextSnapshot`], the serializable mirror persisted by storage
//!   backends

mod framework;
mod history;
mod snapshot;

pub use framework::{FrameworkData, TurnConfig};
pub use history::TurnHistory;
pub use snapshot::ContextSnapshot;

use crate::core::{ComponentState, Message, NodeLabel};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

/// The unit of conversation state, identified by an opaque key.
///
/// Exactly one `Context` instance is shared by every component invoked
/// during a turn; interior locks make the short synchronous mutations
/// safe under concurrent siblings. Locks are never held across await
/// points. Components write disjoint regions by convention — their own
/// path in the execution-state store, their own keys in the scratch and
/// auxiliary maps.
pub struct Context {
    id: String,
    created_at: DateTime<Utc>,
    updated_at: RwLock<DateTime<Utc>>,
    history: RwLock<TurnHistory>,
    misc: RwLock<HashMap<String, serde_json::Value>>,
    framework: FrameworkData,
}

impl Context {
    /// Creates a fresh context for the given conversation key.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            created_at: now,
            updated_at: RwLock::new(now),
            history: RwLock::new(TurnHistory::default()),
            misc: RwLock::new(HashMap::new()),
            framework: FrameworkData::default(),
        }
    }

    /// Returns the conversation key.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Appends a request to the history, returning its turn index.
    pub fn add_request(&self, request: Message) -> u64 {
        self.history.write().add_request(request)
    }

    /// Appends a response to the history, returning its turn index.
    pub fn add_response(&self, response: Message) -> u64 {
        self.history.write().add_response(response)
    }

    /// Appends a dialog label to the history, returning its turn index.
    pub fn add_label(&self, label: NodeLabel) -> u64 {
        self.history.write().add_label(label)
    }

    /// The most recent request, if any.
    #[must_use]
    pub fn last_request(&self) -> Option<Message> {
        self.history.read().last_request().cloned()
    }

    /// The most recent response, if any.
    ///
    /// After a turn this is the externally observable result; its
    /// absence signals a failed actor step.
    #[must_use]
    pub fn last_response(&self) -> Option<Message> {
        self.history.read().last_response().cloned()
    }

    /// The most recent dialog label, if any.
    #[must_use]
    pub fn last_label(&self) -> Option<NodeLabel> {
        self.history.read().last_label().cloned()
    }

    /// Returns a copy of the full turn history.
    #[must_use]
    pub fn history(&self) -> TurnHistory {
        self.history.read().clone()
    }

    /// Reads an auxiliary data entry.
    #[must_use]
    pub fn misc_get(&self, key: &str) -> Option<serde_json::Value> {
        self.misc.read().get(key).cloned()
    }

    /// Writes an auxiliary data entry.
    pub fn misc_insert(&self, key: impl Into<String>, value: serde_json::Value) {
        self.misc.write().insert(key.into(), value);
    }

    /// Merges a map of overrides into the auxiliary data.
    pub fn merge_misc(&self, overrides: HashMap<String, serde_json::Value>) {
        self.misc.write().extend(overrides);
    }

    /// Engine-internal transient data for the current turn.
    #[must_use]
    pub fn framework(&self) -> &FrameworkData {
        &self.framework
    }

    /// Records the execution state of a component path.
    pub fn set_state(&self, path: &str, state: ComponentState) {
        self.framework.set_state(path, state);
    }

    /// Looks up the execution state of a component path; absent entries
    /// report [`ComponentState::NotRun`].
    #[must_use]
    pub fn state_of(&self, path: &str) -> ComponentState {
        self.framework.state_of(path)
    }

    /// Stamps the last-modified time; called by the driver before the
    /// context is persisted.
    pub fn touch(&self) {
        *self.updated_at.write() = Utc::now();
    }

    /// Captures the durable portion of this context.
    #[must_use]
    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            id: self.id.clone(),
            created_at: self.created_at,
            updated_at: *self.updated_at.read(),
            history: self.history.read().clone(),
            misc: self.misc.read().clone(),
        }
    }

    /// Restores a context from a stored snapshot. The transient
    /// framework data starts empty.
    #[must_use]
    pub fn from_snapshot(snapshot: ContextSnapshot) -> Self {
        Self {
            id: snapshot.id,
            created_at: snapshot.created_at,
            updated_at: RwLock::new(snapshot.updated_at),
            history: RwLock::new(snapshot.history),
            misc: RwLock::new(snapshot.misc),
            framework: FrameworkData::default(),
        }
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.id)
            .field("requests", &self.history.read().requests().len())
            .field("responses", &self.history.read().responses().len())
            .finish_non_exhaustive()
    }
}
