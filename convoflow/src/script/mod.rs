//! A minimal dialog graph and the actor that advances it.
//!
//! The graph is intentionally narrow: named nodes with a response and a
//! list of conditional transitions. It exists to drive the pipeline's
//! actor component; a full scripting layer with its own condition and
//! destination grammar would sit on top of the same [`ScriptActor`]
//! contract.

mod actor;

pub use actor::ScriptActor;

use crate::core::{Message, NodeLabel};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Decides whether a transition fires for the incoming request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransitionCnd {
    /// Fires unconditionally.
    True,
    /// Fires when the request equals the given message.
    ExactMatch(Message),
}

impl TransitionCnd {
    /// Evaluates the condition against the turn's request.
    #[must_use]
    pub fn matches(&self, request: Option<&Message>) -> bool {
        match self {
            Self::True => true,
            Self::ExactMatch(expected) => request == Some(expected),
        }
    }
}

/// A conditional edge of the dialog graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// Where the dialog moves when the condition fires.
    pub dst: NodeLabel,
    /// The firing condition.
    pub cnd: TransitionCnd,
}

/// One node of the dialog graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// The response produced when the dialog lands on this node.
    pub response: Message,
    /// Outgoing transitions, checked in order.
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

impl Node {
    /// Creates a node with the given response and no transitions.
    #[must_use]
    pub fn new(response: impl Into<Message>) -> Self {
        Self {
            response: response.into(),
            transitions: Vec::new(),
        }
    }

    /// Appends a transition.
    #[must_use]
    pub fn with_transition(mut self, dst: impl Into<NodeLabel>, cnd: TransitionCnd) -> Self {
        self.transitions.push(Transition {
            dst: dst.into(),
            cnd,
        });
        self
    }
}

/// The dialog graph: nodes addressed by label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    nodes: HashMap<NodeLabel, Node>,
}

impl Script {
    /// Creates an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node under the given label.
    #[must_use]
    pub fn with_node(mut self, label: impl Into<NodeLabel>, node: Node) -> Self {
        self.nodes.insert(label.into(), node);
        self
    }

    /// Looks up a node by label.
    #[must_use]
    pub fn node(&self, label: &NodeLabel) -> Option<&Node> {
        self.nodes.get(label)
    }

    /// Returns true if the label resolves to a node.
    #[must_use]
    pub fn contains(&self, label: &NodeLabel) -> bool {
        self.nodes.contains_key(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_lookup() {
        let script = Script::new()
            .with_node(("flow", "start"), Node::new("hello"))
            .with_node(("flow", "end"), Node::new("bye"));

        assert!(script.contains(&NodeLabel::new("flow", "start")));
        assert!(!script.contains(&NodeLabel::new("flow", "missing")));
        assert_eq!(
            script
                .node(&NodeLabel::new("flow", "end"))
                .map(|node| node.response.clone()),
            Some(Message::from("bye"))
        );
    }

    #[test]
    fn test_transition_conditions() {
        assert!(TransitionCnd::True.matches(None));
        let exact = TransitionCnd::ExactMatch(Message::from("hi"));
        assert!(exact.matches(Some(&Message::from("hi"))));
        assert!(!exact.matches(Some(&Message::from("bye"))));
        assert!(!exact.matches(None));
    }
}
