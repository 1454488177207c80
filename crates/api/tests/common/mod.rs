#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use kapruka_core::alert::NotificationRequest;
use kapruka_events::{DispatchError, EventBus, MoistureMonitor, NotificationDispatcher, NotificationPolicy};
use tokio::sync::Mutex;
use tower::ServiceExt;

use kapruka_api::config::ServerConfig;
use kapruka_api::router::build_app_router;
use kapruka_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:8081".parse().unwrap()],
        request_timeout_secs: 30,
        notification_policy: NotificationPolicy::default(),
        notification_webhook_url: None,
    }
}

/// Dispatcher that records every notification it is asked to send.
#[derive(Default)]
pub struct RecordingDispatcher {
    pub sent: Mutex<Vec<NotificationRequest>>,
    pub fail: bool,
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    fn channel(&self) -> &'static str {
        "recording"
    }

    async fn notify(&self, request: &NotificationRequest) -> Result<(), DispatchError> {
        self.sent.lock().await.push(request.clone());
        if self.fail {
            return Err(DispatchError::NoListeners);
        }
        Ok(())
    }
}

/// Everything a test needs to drive the app and inspect side effects.
pub struct TestApp {
    pub router: Router,
    pub dispatcher: Arc<RecordingDispatcher>,
    pub state: AppState,
}

/// Build the full application router around the given dispatcher.
pub fn build_test_app_with(dispatcher: RecordingDispatcher) -> TestApp {
    let config = test_config();
    let dispatcher = Arc::new(dispatcher);

    let state = AppState {
        config: Arc::new(config.clone()),
        monitor: Arc::new(MoistureMonitor::new(dispatcher.clone())),
        report_bus: Arc::new(EventBus::default()),
    };

    TestApp {
        router: build_app_router(state.clone(), &config),
        dispatcher,
        state,
    }
}

pub fn build_test_app() -> TestApp {
    build_test_app_with(RecordingDispatcher::default())
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, json: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
