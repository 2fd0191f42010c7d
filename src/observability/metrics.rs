//! Metrics collection and exposition.
//!
//! # Metrics
//! - `catalog_http_errors_total` (counter): classified error responses by kind
//! - `catalog_auth_rejections_total` (counter): 401s from the authorization gateway
//! - `catalog_lifecycle_signals_total` (counter): what ended the serve loop

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_http_error(kind: &'static str) {
    counter!("catalog_http_errors_total", "kind" => kind).increment(1);
}

pub fn record_auth_rejection(reason: &'static str) {
    counter!("catalog_auth_rejections_total", "reason" => reason).increment(1);
}

pub fn record_lifecycle_signal(signal: &'static str) {
    counter!("catalog_lifecycle_signals_total", "signal" => signal).increment(1);
}
