use axum::routing::post;
use axum::Router;

use crate::handlers::devices;
use crate::state::AppState;

/// Routes mounted at `/devices`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{device_id}/moisture-check", post(devices::check_moisture))
        .route("/{device_id}/readings", post(devices::submit_reading))
}
