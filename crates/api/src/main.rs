use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use kapruka_events::{
    handler, EventBus, LocalDispatcher, MoistureMonitor, NotificationDispatcher, NotificationLog,
    WebhookDispatcher,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kapruka_api::config::ServerConfig;
use kapruka_api::router::build_app_router;
use kapruka_api::state::AppState;

/// How long background tasks get to finish after the server stops.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "kapruka_api=debug,kapruka_events=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env()?;
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Notification handler ---
    let policy = *handler::init(config.notification_policy)?;

    // --- Notification bus + presenter ---
    let notification_bus = Arc::new(EventBus::default());
    let log_handle = tokio::spawn(NotificationLog::run(notification_bus.subscribe()));

    // --- Dispatcher ---
    let dispatcher: Arc<dyn NotificationDispatcher> = match &config.notification_webhook_url {
        Some(url) => {
            tracing::info!(url = %url, "Dispatching alerts to webhook");
            Arc::new(WebhookDispatcher::new(url.clone())?)
        }
        None => {
            let local = LocalDispatcher::new(Arc::clone(&notification_bus), policy);
            let permission = local.request_permission().await;
            tracing::info!(%permission, "Dispatching alerts locally");
            Arc::new(local)
        }
    };

    // --- Moisture monitor ---
    let monitor = Arc::new(MoistureMonitor::new(dispatcher));
    let report_bus = Arc::new(EventBus::default());
    let monitor_cancel = CancellationToken::new();
    let monitor_handle = tokio::spawn({
        let monitor = Arc::clone(&monitor);
        let receiver = report_bus.subscribe();
        let cancel = monitor_cancel.clone();
        async move { monitor.run(receiver, cancel).await }
    });
    tracing::info!("Moisture monitor started");

    // --- App state + router ---
    let state = AppState {
        config: Arc::new(config.clone()),
        monitor,
        report_bus: Arc::clone(&report_bus),
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let host = config
        .host
        .parse()
        .with_context(|| format!("Invalid HOST address '{}'", config.host))?;
    let addr = SocketAddr::new(host, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    monitor_cancel.cancel();
    match tokio::time::timeout(SHUTDOWN_GRACE, monitor_handle).await {
        Ok(Ok(())) => tracing::info!("Moisture monitor stopped"),
        Ok(Err(e)) => tracing::warn!(error = %e, "Moisture monitor task failed"),
        Err(_) => tracing::warn!(
            grace_secs = SHUTDOWN_GRACE.as_secs(),
            "Moisture monitor did not stop in time"
        ),
    }

    // Dropping the last sender closes the channel and stops the presenter.
    drop(report_bus);
    drop(notification_bus);
    match tokio::time::timeout(SHUTDOWN_GRACE, log_handle).await {
        Ok(Ok(())) => tracing::info!("Notification presenter stopped"),
        Ok(Err(e)) => tracing::warn!(error = %e, "Notification presenter task failed"),
        Err(_) => tracing::warn!(
            grace_secs = SHUTDOWN_GRACE.as_secs(),
            "Notification presenter did not stop in time"
        ),
    }

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for SIGINT or SIGTERM to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
