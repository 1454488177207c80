//! Notification requests produced from moisture decisions.

use serde::{Deserialize, Serialize};

use crate::moisture::AlertDecision;

/// Fixed title of every low-moisture notification.
pub const LOW_MOISTURE_TITLE: &str = "Low Soil Moisture Alert";

/// Kinds of alert a notification can carry in its metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Averaged soil moisture fell below the watering threshold.
    MoistureAlert,
}

/// Structured payload attached to a notification.
///
/// The host app reads it to deep-link into the device screen or to
/// deduplicate on its side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertMetadata {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub device_id: String,
    pub moisture_level: i32,
}

/// A message ready to hand to a notification dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    pub metadata: AlertMetadata,
}

impl AlertDecision {
    /// Build the watering-recommendation notification for this decision.
    ///
    /// The caller is expected to check [`AlertDecision::should_alert`]
    /// first; this method does not.
    pub fn notification(&self, device_id: &str) -> NotificationRequest {
        NotificationRequest {
            title: LOW_MOISTURE_TITLE.to_string(),
            body: format!(
                "Soil moisture at {} is {}%. Consider watering your coconut trees.",
                self.display_name, self.average_moisture
            ),
            metadata: AlertMetadata {
                kind: AlertKind::MoistureAlert,
                device_id: device_id.to_string(),
                moisture_level: self.average_moisture,
            },
        }
    }
}
