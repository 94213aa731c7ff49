//! Log output setup for binaries built on Partyforge.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

/// Installs a formatted `tracing` subscriber filtered by `RUST_LOG`.
///
/// Returns `false` when a global subscriber was already installed, which
/// makes repeated calls (tests, embedding binaries) harmless.
pub fn init() -> bool {
    let from_env = EnvFilter::try_from_default_env();
    let filter_source = if from_env.is_ok() { "RUST_LOG" } else { DEFAULT_FILTER };
    let filter = from_env.unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok();
    if installed {
        tracing::info!(
            filter = filter_source,
            version = env!("CARGO_PKG_VERSION"),
            "partyforge logging ready"
        );
    } else {
        tracing::debug!("tracing subscriber already installed");
    }
    installed
}
