//! Tracing setup for hosts and examples.

use tracing_subscriber::EnvFilter;

/// Installs a stderr subscriber honoring `RUST_LOG`, defaulting to `info`.
///
/// Safe to call more than once; later calls are no-ops. Library code only
/// emits events and never installs a subscriber on its own.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
