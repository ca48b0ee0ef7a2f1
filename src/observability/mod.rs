//! Observability of the pipeline itself.
//!
//! # Data Flow
//! ```text
//! dispatch workers, middleware, config reload produce:
//!     → logging.rs (tracing events for internal diagnostics)
//!     → metrics.rs (record counters per sink)
//!
//! Consumers:
//!     → stdout via tracing-subscriber
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Kept apart from the audit pipeline: a failing sink is still visible here
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
