//! Metrics collection and exposition.
//!
//! # Metrics
//! - `client_setup_config_reloads_total` (counter): reparse cycles by outcome
//!   (`applied`, `unchanged`, `rejected`)
//! - `client_setup_client_constructions_total` (counter): clients built, by service
//! - `client_setup_settings_generation` (gauge): generation of the live settings
//!
//! # Design Decisions
//! - Without an installed recorder every call is a no-op
//! - Prometheus exposition is opt-in from the binary

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_reload(outcome: &'static str) {
    metrics::counter!("client_setup_config_reloads_total", "outcome" => outcome).increment(1);
}

pub fn record_settings_generation(generation: u64) {
    metrics::gauge!("client_setup_settings_generation").set(generation as f64);
}

pub fn record_client_construction(service: &'static str) {
    metrics::counter!("client_setup_client_constructions_total", "service" => service).increment(1);
}
