//! Test support: fixtures and mock components.
//!
//! These helpers are public so downstream crates can reuse them in
//! their own test suites.

pub mod fixtures;
pub mod mocks;

pub use fixtures::{check_happy_path, minimal_pipeline, toy_script};
pub use mocks::{shared_log, RecordingHandler, ScriptedMessenger, SharedLog};
