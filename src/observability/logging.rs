//! Structured logging for the crate's own diagnostics.
//!
//! # Responsibilities
//! - Initialize the `tracing` subscriber
//! - Configure log level from config, overridable via `RUST_LOG`
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Audit records never flow through here; they go through the pipeline
//! - Initialising twice is harmless (tests, embedded hosts)

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. `default_level` is used when `RUST_LOG`
/// is unset or invalid.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("traffic_audit={default_level},tower_http={default_level}"))
    });

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
