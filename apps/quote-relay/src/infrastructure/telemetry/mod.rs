//! Tracing Initialization
//!
//! Structured logging via tracing-subscriber. The filter comes from
//! `RUST_LOG`, defaulting to `info`.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

/// Install the global tracing subscriber.
///
/// Calling this more than once is a no-op rather than a panic, so tests
/// that each initialize logging do not interfere with one another.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
