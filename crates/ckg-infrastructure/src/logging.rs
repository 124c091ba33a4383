//! Logging initialization.
//!
//! Single entry point wiring `tracing` to a subscriber with env-filter
//! support; call once at process start. The logging backend itself stays an
//! implementation detail of this module.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// The filter comes from `CKG_LOG` (falling back to `RUST_LOG`, then
/// `info`). Repeated calls are ignored so tests can initialize freely.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env("CKG_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
