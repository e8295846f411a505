//! Metrics collection and exposition.
//!
//! # Metrics
//! - `supervisor_server_starts_total` (counter): servers launched, by server
//! - `supervisor_server_failures_total` (counter): start errors, by server
//! - `supervisor_shutdown_errors_total` (counter): shutdown errors, by server
//! - `supervisor_health_requests_total` (counter): health endpoint hits
//! - `supervisor_health_responses_total` (counter): by code and health_status
//! - `supervisor_health_latency_seconds` (histogram): health endpoint latency
//!
//! Recording is a no-op until [`install_recorder`] has run.

use std::sync::OnceLock;
use std::time::Instant;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::health::HealthStatus;

static HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

/// Install the process-wide Prometheus recorder.
///
/// Safe to call more than once; later calls return the first outcome.
pub fn install_recorder() -> Option<PrometheusHandle> {
    HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                tracing::info!("Prometheus recorder installed");
                Some(handle)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install Prometheus recorder");
                None
            }
        })
        .clone()
}

pub fn record_server_start(server: &str) {
    metrics::counter!("supervisor_server_starts_total", "server" => server.to_string())
        .increment(1);
}

pub fn record_server_failure(server: &str) {
    metrics::counter!("supervisor_server_failures_total", "server" => server.to_string())
        .increment(1);
}

pub fn record_shutdown_error(server: &str) {
    metrics::counter!("supervisor_shutdown_errors_total", "server" => server.to_string())
        .increment(1);
}

pub fn record_health_request() {
    metrics::counter!("supervisor_health_requests_total").increment(1);
}

/// Record a health response and its latency.
pub fn record_health_response(code: u16, status: HealthStatus, started: Instant) {
    metrics::counter!(
        "supervisor_health_responses_total",
        "code" => code.to_string(),
        "health_status" => status.as_str()
    )
    .increment(1);
    metrics::histogram!("supervisor_health_latency_seconds")
        .record(started.elapsed().as_secs_f64());
}
