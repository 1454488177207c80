//! Integration tests for the health check endpoint and general HTTP behaviour.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, get};

#[tokio::test]
async fn health_reports_degraded_without_monitor() {
    let app = build_test_app();
    let response = get(app.router, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "degraded");
    assert!(json["version"].is_string());
    assert_eq!(json["monitor_running"], false);
}

#[tokio::test]
async fn health_reports_ok_with_monitor_subscribed() {
    let app = build_test_app();
    let _rx = app.state.report_bus.subscribe();

    let json = body_json(get(app.router, "/health").await).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["monitor_running"], true);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = build_test_app();
    let response = get(app.router, "/this-route-does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn response_contains_x_request_id_header() {
    let app = build_test_app();
    let response = get(app.router, "/health").await;

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("Response must contain an x-request-id header");

    // The value should be a UUID (36 chars with hyphens).
    assert_eq!(request_id.to_str().unwrap().len(), 36);
}
