//! Logging bootstrap.

use tracing_subscriber::EnvFilter;

/// Initialize structured logging (set `RUST_LOG=debug` for verbose output).
///
/// Safe to call once per process; subsequent calls are ignored.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
