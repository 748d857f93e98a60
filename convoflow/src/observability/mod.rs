//! Logging setup helpers.

use tracing_subscriber::EnvFilter;

/// Initializes a global `tracing` subscriber with an env-filtered
/// formatter (`RUST_LOG` controls verbosity).
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
