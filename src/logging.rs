//! Logging setup shared by the `carbridge` and `car-worker` binaries.
//!
//! Logs go to stderr so command output on stdout stays machine-readable.
//! The level is taken from `RUST_LOG` when set, otherwise from the
//! directive passed in by the binary.

use std::io;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// Fails if a subscriber is already installed.
pub fn init_logging(default_directive: &str) -> Result<(), TryInitError> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter(default_directive))
        .with(stderr_layer)
        .try_init()
}

/// Filter from `RUST_LOG`, falling back to `default_directive`.
pub fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}
