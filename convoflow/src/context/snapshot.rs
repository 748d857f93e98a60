//! Serializable mirror of a context's durable state.

use super::history::TurnHistory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The durable portion of a [`Context`](super::Context), suitable for
/// handing to a storage backend.
///
/// Transient framework data (the execution-state store, turn-scoped
/// scratch) is deliberately absent: it must never survive a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    /// The opaque conversation key.
    pub id: String,
    /// When the conversation was first seen.
    pub created_at: DateTime<Utc>,
    /// When the conversation was last persisted.
    pub updated_at: DateTime<Utc>,
    /// Full turn history.
    pub history: TurnHistory,
    /// Free-form auxiliary data.
    #[serde(default)]
    pub misc: HashMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Message;

    #[test]
    fn test_snapshot_serde_round_trip() {
        let mut history = TurnHistory::default();
        history.add_request(Message::from("hi"));
        history.add_response(Message::from("hello"));

        let snapshot = ContextSnapshot {
            id: "u1".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            history,
            misc: HashMap::from([("locale".into(), serde_json::json!("en"))]),
        };

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: ContextSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
