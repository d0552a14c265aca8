//! Logging setup
//!
//! Diagnostics go to stderr so that stdout carries only the inventory CSV.
//! The filter comes from `RUST_LOG` and defaults to `warn`, which shows
//! rejected operations and skipped rows. `RUST_LOG=info` adds the replay
//! summary, `RUST_LOG=debug` every committed operation.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn";

/// Install the global fmt subscriber
///
/// Calling it again after a subscriber is installed has no effect.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
