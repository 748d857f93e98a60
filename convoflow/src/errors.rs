//! Error types for the convoflow framework.
//!
//! Failures fall into two families: build-time errors that prevent a
//! pipeline from ever becoming runnable, and per-turn errors. Of the
//! per-turn family only driver errors (context storage, messenger)
//! surface to the caller; component failures are recorded in the
//! execution-state store and logged, never raised.

use crate::core::NodeLabel;
use thiserror::Error;

/// A fatal error raised while constructing a pipeline.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A component name was blank or contained the path separator.
    #[error("component name must not be blank or contain '.': {name:?}")]
    InvalidName {
        /// The offending name.
        name: String,
    },

    /// Two sibling components resolved to the same name.
    #[error("duplicate component name '{name}' under '{parent}'")]
    DuplicateName {
        /// The colliding name.
        name: String,
        /// Path of the enclosing group.
        parent: String,
    },

    /// No actor component was found anywhere in the tree.
    #[error("no actor component found in the pipeline")]
    ActorNotFound,

    /// More than one actor component was found in the tree.
    #[error("expected exactly one actor component, found {count}")]
    MultipleActors {
        /// How many actor components were found.
        count: usize,
    },

    /// A configured label does not exist in the script.
    #[error("unknown {kind} label: {label}")]
    UnknownLabel {
        /// Which configuration field referenced the label.
        kind: &'static str,
        /// The unresolved label.
        label: NodeLabel,
    },
}

/// An error surfaced to the caller of a pipeline turn.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The context storage collaborator failed.
    #[error("context storage error: {0}")]
    Storage(#[from] StorageError),

    /// The messenger collaborator failed.
    #[error("messenger error: {0}")]
    Messenger(String),
}

/// An error raised by a context storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached.
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    /// A stored context could not be encoded or decoded.
    #[error("context serialization error: {0}")]
    Serialization(String),
}

/// A failure reported by a service handler or extra handler.
///
/// These never abort the turn: the owning component is recorded
/// [`Failed`](crate::core::ComponentState::Failed) and execution of
/// siblings continues.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ServiceError {
    /// Human-readable failure description.
    message: String,
}

impl ServiceError {
    /// Creates a service error from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<&str> for ServiceError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for ServiceError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_error_display() {
        let err = BuildError::DuplicateName {
            name: "db".into(),
            parent: ".pipeline".into(),
        };
        assert_eq!(err.to_string(), "duplicate component name 'db' under '.pipeline'");

        let err = BuildError::UnknownLabel {
            kind: "start",
            label: NodeLabel::new("flow", "missing"),
        };
        assert_eq!(err.to_string(), "unknown start label: flow:missing");
    }

    #[test]
    fn test_service_error_from_str() {
        let err = ServiceError::from("boom");
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_pipeline_error_from_storage() {
        let err = PipelineError::from(StorageError::Unavailable("down".into()));
        assert!(err.to_string().contains("down"));
    }
}
