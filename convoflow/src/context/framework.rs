//! Engine-internal transient context data.

use crate::core::{ComponentState, NodeLabel};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-turn dialog configuration recorded by the pipeline driver before
/// the root group runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnConfig {
    /// Where the dialog begins when the context has no label history.
    pub start_label: NodeLabel,
    /// Where the dialog falls back when no transition matches.
    pub fallback_label: NodeLabel,
}

/// Framework-owned transient state attached to a [`Context`](super::Context).
///
/// Everything in here is scoped to the current turn and cleared when the
/// turn ends; none of it is persisted by context storage backends.
#[derive(Debug, Default)]
pub struct FrameworkData {
    /// Execution state of every component invoked this turn, keyed by path.
    service_states: RwLock<HashMap<String, ComponentState>>,
    /// Free-form turn-scoped scratch data for components.
    scratch: RwLock<HashMap<String, serde_json::Value>>,
    /// The dialog configuration for the current turn.
    turn_config: RwLock<Option<TurnConfig>>,
}

impl FrameworkData {
    /// Records the execution state of a component path.
    pub fn set_state(&self, path: &str, state: ComponentState) {
        self.service_states.write().insert(path.to_string(), state);
    }

    /// Looks up the execution state of a component path.
    ///
    /// Paths with no recorded entry report [`ComponentState::NotRun`].
    #[must_use]
    pub fn state_of(&self, path: &str) -> ComponentState {
        self.service_states
            .read()
            .get(path)
            .copied()
            .unwrap_or_default()
    }

    /// Returns a copy of the full execution-state store.
    #[must_use]
    pub fn execution_states(&self) -> HashMap<String, ComponentState> {
        self.service_states.read().clone()
    }

    /// Returns true if no execution state has been recorded.
    #[must_use]
    pub fn execution_states_empty(&self) -> bool {
        self.service_states.read().is_empty()
    }

    /// Stores a turn-scoped scratch value.
    pub fn scratch_insert(&self, key: impl Into<String>, value: serde_json::Value) {
        self.scratch.write().insert(key.into(), value);
    }

    /// Reads a turn-scoped scratch value.
    #[must_use]
    pub fn scratch_get(&self, key: &str) -> Option<serde_json::Value> {
        self.scratch.read().get(key).cloned()
    }

    /// Sets the dialog configuration for the current turn.
    pub fn set_turn_config(&self, config: TurnConfig) {
        *self.turn_config.write() = Some(config);
    }

    /// Returns the dialog configuration for the current turn, if set.
    #[must_use]
    pub fn turn_config(&self) -> Option<TurnConfig> {
        self.turn_config.read().clone()
    }

    /// Drops all transient data at the end of a turn.
    pub fn clear(&self) {
        self.service_states.write().clear();
        self.scratch.write().clear();
        *self.turn_config.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_path_reports_not_run() {
        let data = FrameworkData::default();
        assert_eq!(data.state_of(".pipeline.ghost"), ComponentState::NotRun);
    }

    #[test]
    fn test_state_lookup_is_idempotent() {
        let data = FrameworkData::default();
        data.set_state(".pipeline.svc", ComponentState::Finished);
        assert_eq!(data.state_of(".pipeline.svc"), ComponentState::Finished);
        assert_eq!(data.state_of(".pipeline.svc"), ComponentState::Finished);
    }

    #[test]
    fn test_clear_drops_everything() {
        let data = FrameworkData::default();
        data.set_state(".pipeline.svc", ComponentState::Running);
        data.scratch_insert("key", serde_json::json!(1));
        data.set_turn_config(TurnConfig {
            start_label: NodeLabel::new("f", "start"),
            fallback_label: NodeLabel::new("f", "fallback"),
        });

        data.clear();

        assert!(data.execution_states_empty());
        assert!(data.scratch_get("key").is_none());
        assert!(data.turn_config().is_none());
    }
}
