//! Core value types shared across the framework.
//!
//! This module provides:
//! - User-facing message and dialog label types
//! - The per-turn component lifecycle state

mod label;
mod message;
mod state;

pub use label::NodeLabel;
pub use message::Message;
pub use state::ComponentState;
