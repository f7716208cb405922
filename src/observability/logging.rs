//! Subscriber setup
//!
//! The library only emits `tracing` events; binaries and tests decide where
//! they go.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs a subscriber honouring `RUST_LOG` (default: "info")
pub fn init() {
    init_with_level("info")
}

/// Installs a subscriber with `level` as the fallback filter.
///
/// Does nothing if a global subscriber is already set.
pub fn init_with_level(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Verbose subscriber for tests, captured by the test harness
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
