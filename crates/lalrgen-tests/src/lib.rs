//! Shared fixtures for the integration tests of `lalrgen`.

pub mod grammars;

use tracing_subscriber::EnvFilter;

/// Install a log subscriber controlled by `RUST_LOG`.
///
/// Calling this more than once is harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
