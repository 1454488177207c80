pub mod devices;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /devices/{device_id}/moisture-check     evaluate a reading now (POST)
/// /devices/{device_id}/readings           queue a report for the monitor (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/devices", devices::router())
}
