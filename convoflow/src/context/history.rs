//! Ordered turn history of a conversation.

use crate::core::{Message, NodeLabel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn next_index<V>(map: &BTreeMap<u64, V>) -> u64 {
    map.keys().next_back().map_or(0, |last| last + 1)
}

/// Append-only history of requests, responses and dialog labels,
/// keyed by increasing turn index.
///
/// The three sequences are indexed independently: a turn that produced
/// no response (e.g. a failed actor step) leaves a gap in `responses`
/// but not in `requests`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnHistory {
    requests: BTreeMap<u64, Message>,
    responses: BTreeMap<u64, Message>,
    labels: BTreeMap<u64, NodeLabel>,
}

impl TurnHistory {
    /// Appends a request under the next free index and returns that index.
    pub fn add_request(&mut self, request: Message) -> u64 {
        let index = next_index(&self.requests);
        self.requests.insert(index, request);
        index
    }

    /// Appends a response under the next free index and returns that index.
    pub fn add_response(&mut self, response: Message) -> u64 {
        let index = next_index(&self.responses);
        self.responses.insert(index, response);
        index
    }

    /// Appends a dialog label under the next free index and returns that index.
    pub fn add_label(&mut self, label: NodeLabel) -> u64 {
        let index = next_index(&self.labels);
        self.labels.insert(index, label);
        index
    }

    /// Returns the most recent request, if any.
    #[must_use]
    pub fn last_request(&self) -> Option<&Message> {
        self.requests.values().next_back()
    }

    /// Returns the most recent response, if any.
    #[must_use]
    pub fn last_response(&self) -> Option<&Message> {
        self.responses.values().next_back()
    }

    /// Returns the most recent dialog label, if any.
    #[must_use]
    pub fn last_label(&self) -> Option<&NodeLabel> {
        self.labels.values().next_back()
    }

    /// All recorded requests, ordered by turn index.
    #[must_use]
    pub fn requests(&self) -> &BTreeMap<u64, Message> {
        &self.requests
    }

    /// All recorded responses, ordered by turn index.
    #[must_use]
    pub fn responses(&self) -> &BTreeMap<u64, Message> {
        &self.responses
    }

    /// All recorded labels, ordered by turn index.
    #[must_use]
    pub fn labels(&self) -> &BTreeMap<u64, NodeLabel> {
        &self.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_start_at_zero_and_increase() {
        let mut history = TurnHistory::default();
        assert_eq!(history.add_request(Message::from("a")), 0);
        assert_eq!(history.add_request(Message::from("b")), 1);
        assert_eq!(history.add_request(Message::from("c")), 2);
        assert_eq!(history.last_request(), Some(&Message::from("c")));
    }

    #[test]
    fn test_sequences_are_indexed_independently() {
        let mut history = TurnHistory::default();
        history.add_request(Message::from("one"));
        history.add_request(Message::from("two"));
        assert_eq!(history.add_response(Message::from("late reply")), 0);
        assert_eq!(history.add_label(NodeLabel::new("f", "n")), 0);
    }

    #[test]
    fn test_empty_history() {
        let history = TurnHistory::default();
        assert!(history.last_request().is_none());
        assert!(history.last_response().is_none());
        assert!(history.last_label().is_none());
    }
}
