//! Logging initialization.
//!
//! Binaries and test harnesses call [`init`] once; repeated calls are
//! harmless so parallel tests can each attempt initialization.

use tracing_subscriber::EnvFilter;

/// Initialize a structured logging subscriber.
///
/// The filter comes from `RUST_LOG` when set, falling back to
/// `default_directive` otherwise. Returns quietly if a subscriber is
/// already installed.
pub fn init(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
