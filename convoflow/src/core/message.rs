//! The message type exchanged between users and the pipeline.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A single message in a conversation, either a user request or an
/// agent response.
///
/// The `misc` map carries arbitrary attachment data (button payloads,
/// media references, platform-specific extras) that the engine itself
/// never interprets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Plain text content, if any.
    pub text: Option<String>,
    /// Arbitrary attachment data.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub misc: HashMap<String, serde_json::Value>,
}

impl Message {
    /// Creates a message with the given text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            misc: HashMap::new(),
        }
    }

    /// Returns the text content, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Attaches a misc entry.
    #[must_use]
    pub fn with_misc(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.misc.insert(key.into(), value);
        self
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text.as_deref().unwrap_or(""))
    }
}
