//! The seam between alert evaluation and notification delivery.

use async_trait::async_trait;
use kapruka_core::alert::NotificationRequest;

/// Error type for notification dispatch failures.
///
/// Every variant is recoverable: callers log it and carry on.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The user has not granted notification permission.
    #[error("Notification permission not granted")]
    PermissionDenied,

    /// Nothing is subscribed to present local notifications.
    #[error("No notification listeners are subscribed")]
    NoListeners,

    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote endpoint returned a non-2xx status code.
    #[error("Notification endpoint returned HTTP {0}")]
    HttpStatus(u16),
}

/// Surfaces a notification to the farmer.
///
/// Implementations make a single attempt. Retrying is left to the
/// platform that ultimately displays the message.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Short tag used in logs, e.g. `"local"` or `"webhook"`.
    fn channel(&self) -> &'static str;

    /// Dispatch one notification immediately.
    async fn notify(&self, request: &NotificationRequest) -> Result<(), DispatchError>;
}
