//! Dialog graph labels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A reference to one node of the dialog graph, addressed as
/// `(flow, node)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeLabel {
    /// The flow (top-level grouping of related nodes).
    pub flow: String,
    /// The node within the flow.
    pub node: String,
}

impl NodeLabel {
    /// Creates a label from flow and node names.
    #[must_use]
    pub fn new(flow: impl Into<String>, node: impl Into<String>) -> Self {
        Self {
            flow: flow.into(),
            node: node.into(),
        }
    }
}

impl From<(&str, &str)> for NodeLabel {
    fn from((flow, node): (&str, &str)) -> Self {
        Self::new(flow, node)
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.flow, self.node)
    }
}
