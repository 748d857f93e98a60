//! Component lifecycle state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The per-turn execution state of a pipeline component.
///
/// One entry per component path is kept in the context's transient
/// execution-state store and cleared at the end of every turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentState {
    /// The component's start condition rejected it (or it has not been reached yet).
    NotRun,
    /// The component's body is currently executing.
    Running,
    /// The component's body completed successfully.
    Finished,
    /// The component's body raised an error or exceeded its timeout.
    Failed,
}

impl Default for ComponentState {
    fn default() -> Self {
        Self::NotRun
    }
}

impl fmt::Display for ComponentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRun => write!(f, "not_run"),
            Self::Running => write!(f, "running"),
            Self::Finished => write!(f, "finished"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl ComponentState {
    /// Returns true if the state will not change again this turn.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::NotRun | Self::Finished | Self::Failed)
    }

    /// Returns true if the component ran to completion without failure.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Finished)
    }
}
