//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define pipeline metrics (enqueued, dispatched, dropped, failed records)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `audit_records_enqueued_total` (counter): records accepted by a provider queue, by sink
//! - `audit_records_dispatched_total` (counter): records delivered by a sink
//! - `audit_records_dropped_total` (counter): records refused after shutdown or lost at drain timeout
//! - `audit_dispatch_failures_total` (counter): failed deliveries, by sink and reason
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Without an installed recorder every update is a no-op

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

pub fn record_enqueued(sink: &'static str) {
    counter!("audit_records_enqueued_total", "sink" => sink).increment(1);
}

pub fn record_dispatched(sink: &'static str) {
    counter!("audit_records_dispatched_total", "sink" => sink).increment(1);
}

pub fn record_dropped(sink: &'static str, count: u64) {
    counter!("audit_records_dropped_total", "sink" => sink).increment(count);
}

pub fn record_dispatch_failure(sink: &'static str, reason: &'static str) {
    counter!("audit_dispatch_failures_total", "sink" => sink, "reason" => reason).increment(1);
}
