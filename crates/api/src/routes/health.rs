use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the background moisture monitor is listening for reports.
    pub monitor_running: bool,
}

/// GET /health -- returns service and monitor health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let monitor_running = state.report_bus.subscriber_count() > 0;

    let status = if monitor_running { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        monitor_running,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
