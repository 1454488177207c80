//! Kapruka notification infrastructure.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`, generic over the event type.
//! - [`NotificationDispatcher`]: the seam through which alerts leave the
//!   system, with a local and a webhook implementation under [`delivery`].
//! - [`handler`]: process-wide notification presentation policy.
//! - [`MoistureMonitor`]: evaluates device reports and dispatches
//!   low-moisture alerts.

pub mod bus;
pub mod delivery;
pub mod dispatch;
pub mod handler;
pub mod monitor;

pub use bus::EventBus;
pub use delivery::local::{
    LocalDispatcher, LocalNotification, NotificationLog, NotificationTrigger, PermissionStatus,
};
pub use delivery::webhook::WebhookDispatcher;
pub use dispatch::{DispatchError, NotificationDispatcher};
pub use handler::{HandlerError, NotificationPolicy};
pub use monitor::{CheckOutcome, DeviceReport, MoistureMonitor};
