//! Moisture monitoring: evaluate a reading and notify when it is too dry.
//!
//! [`MoistureMonitor`] holds no per-device state, so it can be shared via
//! `Arc` and called concurrently for any number of devices. Repeated low
//! readings for the same device each produce their own alert.

use std::sync::Arc;

use kapruka_core::moisture::{evaluate, AlertDecision, DeviceReading};
use kapruka_core::types::{DeviceId, Timestamp};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::dispatch::NotificationDispatcher;

/// A device check-in as delivered by the telemetry ingestion path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceReport {
    pub device_id: DeviceId,
    pub location_name: Option<String>,
    /// `None` until the device has produced its first reading.
    pub reading: Option<DeviceReading>,
    pub reported_at: Timestamp,
}

/// Result of a single check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    /// `None` when there was no usable reading to evaluate.
    pub decision: Option<AlertDecision>,
    /// Whether a notification was actually dispatched.
    pub alerted: bool,
}

impl CheckOutcome {
    fn skipped() -> Self {
        Self {
            decision: None,
            alerted: false,
        }
    }
}

/// Evaluates readings and dispatches low-moisture alerts.
pub struct MoistureMonitor {
    dispatcher: Arc<dyn NotificationDispatcher>,
}

impl MoistureMonitor {
    pub fn new(dispatcher: Arc<dyn NotificationDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Evaluate `reading` and dispatch an alert if moisture is low.
    ///
    /// Returns `true` only when an alert was raised and dispatched.
    pub async fn check_and_notify(
        &self,
        reading: Option<&DeviceReading>,
        location_name: Option<&str>,
        device_id: &str,
    ) -> bool {
        self.check(reading, location_name, device_id).await.alerted
    }

    /// Like [`check_and_notify`](Self::check_and_notify), also returning the
    /// decision that was reached.
    ///
    /// Dispatch failures are logged and reported as `alerted: false`; they
    /// never propagate. Readings outside `[0, 100]` are ignored.
    pub async fn check(
        &self,
        reading: Option<&DeviceReading>,
        location_name: Option<&str>,
        device_id: &str,
    ) -> CheckOutcome {
        if let Some(Err(e)) = reading.map(DeviceReading::validate) {
            tracing::warn!(device_id, error = %e, "Ignoring invalid moisture reading");
            return CheckOutcome::skipped();
        }

        let Some(decision) = evaluate(reading, location_name, device_id) else {
            tracing::debug!(device_id, "No reading yet, skipping moisture check");
            return CheckOutcome::skipped();
        };

        if !decision.should_alert {
            tracing::debug!(
                device_id,
                moisture = decision.average_moisture,
                "Soil moisture within range"
            );
            return CheckOutcome {
                decision: Some(decision),
                alerted: false,
            };
        }

        let request = decision.notification(device_id);
        let alerted = match self.dispatcher.notify(&request).await {
            Ok(()) => {
                tracing::info!(
                    device_id,
                    channel = self.dispatcher.channel(),
                    moisture = decision.average_moisture,
                    "Low soil moisture alert dispatched"
                );
                true
            }
            Err(e) => {
                tracing::warn!(
                    device_id,
                    channel = self.dispatcher.channel(),
                    error = %e,
                    "Failed to dispatch low soil moisture alert"
                );
                false
            }
        };

        CheckOutcome {
            decision: Some(decision),
            alerted,
        }
    }

    /// Run the monitoring loop over device reports.
    ///
    /// Exits when `cancel` fires or when the report bus is dropped.
    pub async fn run(
        &self,
        mut receiver: broadcast::Receiver<DeviceReport>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Moisture monitor cancelled");
                    break;
                }
                received = receiver.recv() => match received {
                    Ok(report) => {
                        self.check_and_notify(
                            report.reading.as_ref(),
                            report.location_name.as_deref(),
                            &report.device_id,
                        )
                        .await;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Moisture monitor lagged, some reports were not evaluated");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Report bus closed, moisture monitor shutting down");
                        break;
                    }
                },
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Utc;
    use kapruka_core::alert::NotificationRequest;
    use tokio::sync::Mutex;

    use super::*;
    use crate::bus::EventBus;
    use crate::dispatch::DispatchError;

    /// Dispatcher that records every request and can be told to fail.
    #[derive(Default)]
    struct RecordingDispatcher {
        sent: Mutex<Vec<NotificationRequest>>,
        fail: AtomicBool,
    }

    impl RecordingDispatcher {
        fn failing() -> Self {
            Self {
                fail: AtomicBool::new(true),
                ..Self::default()
            }
        }

        async fn sent(&self) -> Vec<NotificationRequest> {
            self.sent.lock().await.clone()
        }
    }

    #[async_trait]
    impl NotificationDispatcher for RecordingDispatcher {
        fn channel(&self) -> &'static str {
            "recording"
        }

        async fn notify(&self, request: &NotificationRequest) -> Result<(), DispatchError> {
            self.sent.lock().await.push(request.clone());
            if self.fail.load(Ordering::Relaxed) {
                return Err(DispatchError::PermissionDenied);
            }
            Ok(())
        }
    }

    fn monitor() -> (MoistureMonitor, Arc<RecordingDispatcher>) {
        let dispatcher = Arc::new(RecordingDispatcher::default());
        (MoistureMonitor::new(dispatcher.clone()), dispatcher)
    }

    fn report(device_id: &str, reading: Option<DeviceReading>) -> DeviceReport {
        DeviceReport {
            device_id: device_id.to_string(),
            location_name: None,
            reading,
            reported_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn low_reading_dispatches_exactly_once() {
        let (monitor, dispatcher) = monitor();
        let reading = DeviceReading::new(40.0, 25.0, 20.0);

        assert!(monitor.check_and_notify(Some(&reading), None, "DEV001").await);

        let sent = dispatcher.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].title, "Low Soil Moisture Alert");
        assert!(sent[0].body.contains("28%"));
        assert!(sent[0].body.contains("DEV001"));
    }

    #[tokio::test]
    async fn healthy_reading_never_dispatches() {
        let (monitor, dispatcher) = monitor();
        let reading = DeviceReading::new(50.0, 50.0, 50.0);

        assert!(!monitor.check_and_notify(Some(&reading), None, "DEV001").await);
        assert!(dispatcher.sent().await.is_empty());
    }

    #[tokio::test]
    async fn absent_reading_never_dispatches() {
        let (monitor, dispatcher) = monitor();

        assert!(!monitor.check_and_notify(None, Some("East Garden"), "DEV001").await);
        assert!(!monitor.check_and_notify(None, None, "DEV001").await);
        assert!(dispatcher.sent().await.is_empty());
    }

    #[tokio::test]
    async fn location_name_appears_in_body() {
        let (monitor, dispatcher) = monitor();
        let reading = DeviceReading::new(10.0, 10.0, 10.0);

        monitor
            .check_and_notify(Some(&reading), Some("East Garden"), "DEV001")
            .await;

        let sent = dispatcher.sent().await;
        assert!(sent[0].body.contains("East Garden"));
        assert_eq!(sent[0].metadata.device_id, "DEV001");
    }

    #[tokio::test]
    async fn near_threshold_mean_alerts_with_rounded_level() {
        let (monitor, dispatcher) = monitor();
        let reading = DeviceReading::new(29.96, 29.96, 29.96);

        assert!(monitor.check_and_notify(Some(&reading), None, "DEV001").await);
        assert!(dispatcher.sent().await[0].body.contains("30%"));
    }

    #[tokio::test]
    async fn repeated_low_readings_alert_every_time() {
        let (monitor, dispatcher) = monitor();
        let reading = DeviceReading::new(5.0, 5.0, 5.0);

        assert!(monitor.check_and_notify(Some(&reading), None, "DEV001").await);
        assert!(monitor.check_and_notify(Some(&reading), None, "DEV001").await);
        assert_eq!(dispatcher.sent().await.len(), 2);
    }

    #[tokio::test]
    async fn dispatch_failure_returns_false() {
        let dispatcher = Arc::new(RecordingDispatcher::failing());
        let monitor = MoistureMonitor::new(dispatcher.clone());
        let reading = DeviceReading::new(10.0, 10.0, 10.0);

        let outcome = monitor.check(Some(&reading), None, "DEV001").await;
        assert!(!outcome.alerted);
        assert!(outcome.decision.expect("decision reached").should_alert);
        assert_eq!(dispatcher.sent().await.len(), 1);
    }

    #[tokio::test]
    async fn invalid_reading_is_ignored() {
        let (monitor, dispatcher) = monitor();
        let reading = DeviceReading::new(-5.0, 10.0, 10.0);

        let outcome = monitor.check(Some(&reading), None, "DEV001").await;
        assert_eq!(outcome, CheckOutcome::skipped());
        assert!(dispatcher.sent().await.is_empty());
    }

    #[tokio::test]
    async fn run_evaluates_reports_until_bus_closes() {
        let (monitor, dispatcher) = monitor();
        let bus = EventBus::default();
        let rx = bus.subscribe();

        bus.publish(report("DEV001", Some(DeviceReading::new(10.0, 10.0, 10.0))));
        bus.publish(report("DEV002", Some(DeviceReading::new(60.0, 60.0, 60.0))));
        bus.publish(report("DEV003", None));
        bus.publish(report("DEV004", Some(DeviceReading::new(20.0, 25.0, 28.0))));
        drop(bus);

        monitor.run(rx, CancellationToken::new()).await;

        let sent = dispatcher.sent().await;
        let devices: Vec<_> = sent.iter().map(|r| r.metadata.device_id.as_str()).collect();
        assert_eq!(devices, ["DEV001", "DEV004"]);
    }

    #[tokio::test]
    async fn run_stops_on_cancellation() {
        let (monitor, _dispatcher) = monitor();
        let bus: EventBus<DeviceReport> = EventBus::default();
        let cancel = CancellationToken::new();

        let handle = tokio::spawn({
            let rx = bus.subscribe();
            let cancel = cancel.clone();
            async move { monitor.run(rx, cancel).await }
        });

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("monitor should stop promptly")
            .expect("monitor task should not panic");
    }
}
