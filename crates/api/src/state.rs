use std::sync::Arc;

use kapruka_events::{DeviceReport, EventBus, MoistureMonitor};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Evaluates readings submitted for an immediate check.
    pub monitor: Arc<MoistureMonitor>,
    /// Device reports for the background moisture monitor.
    pub report_bus: Arc<EventBus<DeviceReport>>,
}
