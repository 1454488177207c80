//! Immediate, locally generated notifications.
//!
//! [`LocalDispatcher`] turns a [`NotificationRequest`] into a
//! [`LocalNotification`] and publishes it on an [`EventBus`]. There is no
//! scheduling: every notification is presented as soon as it is published.
//! [`NotificationLog`] is the default presenter and writes each one to the
//! log.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use kapruka_core::alert::{AlertMetadata, NotificationRequest};
use kapruka_core::types::Timestamp;
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::bus::EventBus;
use crate::dispatch::{DispatchError, NotificationDispatcher};
use crate::handler::NotificationPolicy;

// ---------------------------------------------------------------------------
// Permission
// ---------------------------------------------------------------------------

/// Whether the user allows notifications to be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

impl fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::Undetermined => "undetermined",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// LocalNotification
// ---------------------------------------------------------------------------

/// When a notification should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTrigger {
    /// Present as soon as it is published.
    Immediate,
}

/// A notification ready to be presented on the device.
#[derive(Debug, Clone, Serialize)]
pub struct LocalNotification {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub metadata: AlertMetadata,
    /// Presentation flags in effect when the notification was created.
    pub presentation: NotificationPolicy,
    pub trigger: NotificationTrigger,
    pub created_at: Timestamp,
}

impl LocalNotification {
    fn from_request(request: &NotificationRequest, presentation: NotificationPolicy) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: request.title.clone(),
            body: request.body.clone(),
            metadata: request.metadata.clone(),
            presentation,
            trigger: NotificationTrigger::Immediate,
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// LocalDispatcher
// ---------------------------------------------------------------------------

/// Dispatches notifications onto the in-process notification bus.
pub struct LocalDispatcher {
    bus: Arc<EventBus<LocalNotification>>,
    policy: NotificationPolicy,
    permission: RwLock<PermissionStatus>,
}

impl LocalDispatcher {
    /// Create a dispatcher that has not asked for permission yet.
    pub fn new(bus: Arc<EventBus<LocalNotification>>, policy: NotificationPolicy) -> Self {
        Self::with_permission(bus, policy, PermissionStatus::Undetermined)
    }

    pub fn with_permission(
        bus: Arc<EventBus<LocalNotification>>,
        policy: NotificationPolicy,
        permission: PermissionStatus,
    ) -> Self {
        Self {
            bus,
            policy,
            permission: RwLock::new(permission),
        }
    }

    pub async fn permission(&self) -> PermissionStatus {
        *self.permission.read().await
    }

    /// Ask for notification permission.
    ///
    /// An undetermined status becomes granted. An explicit denial is final
    /// and is returned unchanged.
    pub async fn request_permission(&self) -> PermissionStatus {
        let mut permission = self.permission.write().await;
        if *permission == PermissionStatus::Undetermined {
            *permission = PermissionStatus::Granted;
        }
        tracing::debug!(permission = %*permission, "Notification permission resolved");
        *permission
    }
}

#[async_trait]
impl NotificationDispatcher for LocalDispatcher {
    fn channel(&self) -> &'static str {
        "local"
    }

    async fn notify(&self, request: &NotificationRequest) -> Result<(), DispatchError> {
        if self.permission().await != PermissionStatus::Granted {
            return Err(DispatchError::PermissionDenied);
        }

        let notification = LocalNotification::from_request(request, self.policy);
        let id = notification.id;

        if self.bus.publish(notification) == 0 {
            return Err(DispatchError::NoListeners);
        }

        tracing::debug!(notification_id = %id, "Local notification published");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// NotificationLog
// ---------------------------------------------------------------------------

/// Background presenter that writes every local notification to the log.
pub struct NotificationLog;

impl NotificationLog {
    /// Run the presentation loop.
    ///
    /// The loop exits when the channel is closed (i.e. the
    /// [`EventBus`] is dropped).
    pub async fn run(mut receiver: broadcast::Receiver<LocalNotification>) {
        loop {
            match receiver.recv().await {
                Ok(notification) => Self::present(&notification),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification log lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Notification bus closed, notification log shutting down");
                    break;
                }
            }
        }
    }

    fn present(notification: &LocalNotification) {
        if notification.presentation.should_show_alert {
            tracing::info!(
                notification_id = %notification.id,
                device_id = %notification.metadata.device_id,
                title = %notification.title,
                body = %notification.body,
                sound = notification.presentation.should_play_sound,
                badge = notification.presentation.should_set_badge,
                "Presenting notification"
            );
        } else {
            tracing::debug!(
                notification_id = %notification.id,
                device_id = %notification.metadata.device_id,
                "Notification delivered without alert"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
