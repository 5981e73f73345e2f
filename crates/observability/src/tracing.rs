//! Tracing/logging initialization.
//!
//! Output is JSON lines on stdout. The filter comes from `ATELIER_LOG`,
//! falling back to `RUST_LOG`, then to `info`.

use tracing_subscriber::EnvFilter;

/// Environment variable consulted first for the log filter.
pub const FILTER_ENV: &str = "ATELIER_LOG";

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    let filter = EnvFilter::try_from_env(FILTER_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    init_with_filter(filter);
}

/// Initialize with an explicit filter, bypassing the environment.
pub fn init_with_filter(filter: EnvFilter) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
