//! Built-in status listener: health, metrics and debug endpoints.
//!
//! # Routes
//! - `GET /health`: runs the aggregator, 200 unless the rollup is `ERROR` (503)
//! - `GET /metrics`: Prometheus text, 404 when no recorder is installed
//! - `GET /debug/config`: effective config as JSON, absent in prod

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::{Mode, SupervisorConfig};
use crate::health::HealthAggregator;
use crate::http::server::HttpServer;
use crate::observability::metrics;

pub const STATUS_SERVER_NAME: &str = "status";

/// State shared by the status handlers.
#[derive(Clone)]
pub struct StatusState {
    pub health: Arc<HealthAggregator>,
    pub metrics: Option<PrometheusHandle>,
    pub config: Arc<SupervisorConfig>,
}

/// Router for the status endpoints.
pub fn status_router(state: StatusState) -> Router {
    let mut router = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler));

    if state.config.mode != Mode::Prod {
        router = router.route("/debug/config", get(config_handler));
    }

    router.with_state(state)
}

/// Status listener as a supervised server.
pub fn status_server(bind_address: SocketAddr, state: StatusState) -> HttpServer {
    let timeout = Duration::from_secs(state.config.status.request_timeout_secs);
    HttpServer::new(STATUS_SERVER_NAME, bind_address, status_router(state))
        .with_request_timeout(timeout)
}

async fn health_handler(State(state): State<StatusState>) -> Response {
    let started = Instant::now();
    metrics::record_health_request();

    let result = state.health.run_checks().await;
    let code = result.http_status_code();
    metrics::record_health_response(code, result.canonical_status, started);

    tracing::debug!(
        status = %result.canonical_status,
        total = result.total,
        "Health check served"
    );

    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        result.to_json(),
    )
        .into_response()
}

async fn metrics_handler(State(state): State<StatusState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}

async fn config_handler(State(state): State<StatusState>) -> Json<SupervisorConfig> {
    Json(state.config.as_ref().clone())
}
