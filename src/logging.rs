//! Tracing subscriber setup for binaries.
//!
//! Library code only emits events; installing a subscriber is left to the
//! embedding application.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the event filter. `RUST_LOG` wins over `default_directive`.
pub fn build_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install a stderr fmt subscriber. Returns `false` if a global subscriber
/// was already installed.
pub fn init_tracing(default_directive: &str) -> bool {
    tracing_subscriber::registry()
        .with(build_filter(default_directive))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .try_init()
        .is_ok()
}
