//! Low soil-moisture evaluation.
//!
//! Pure logic with no I/O. The caller supplies the latest reading for a
//! device and decides what to do with the resulting [`AlertDecision`].
//!
//! No alert history is kept: evaluating the same low reading twice yields
//! two decisions that both request an alert.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::threshold_validation::validate_percent;

/// Averaged moisture (percent) below which watering is recommended.
///
/// Compared against the unrounded mean.
pub const LOW_MOISTURE_THRESHOLD: f64 = 30.0;

/// Volumetric soil moisture reported by a field device at three depths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceReading {
    /// Moisture percentage at 10 cm.
    pub moisture_10cm: f64,
    /// Moisture percentage at 20 cm.
    pub moisture_20cm: f64,
    /// Moisture percentage at 30 cm.
    pub moisture_30cm: f64,
}

impl DeviceReading {
    pub fn new(moisture_10cm: f64, moisture_20cm: f64, moisture_30cm: f64) -> Self {
        Self {
            moisture_10cm,
            moisture_20cm,
            moisture_30cm,
        }
    }

    /// Unweighted arithmetic mean of the three depths.
    pub fn average(&self) -> f64 {
        (self.moisture_10cm + self.moisture_20cm + self.moisture_30cm) / 3.0
    }

    /// Check every depth is a finite percentage in `[0, 100]`.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_percent(self.moisture_10cm, "moisture_10cm")?;
        validate_percent(self.moisture_20cm, "moisture_20cm")?;
        validate_percent(self.moisture_30cm, "moisture_30cm")?;
        Ok(())
    }
}

/// Outcome of evaluating a single reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertDecision {
    /// Whether the unrounded mean fell below [`LOW_MOISTURE_THRESHOLD`].
    pub should_alert: bool,
    /// Mean moisture rounded half away from zero. Display only.
    pub average_moisture: i32,
    /// Location name when known, otherwise the device id.
    pub display_name: String,
}

/// Evaluate the latest reading of a device.
///
/// Returns `None` when the device has not reported yet; that is a normal
/// "nothing to do" outcome rather than an error.
///
/// The reading is expected to have passed [`DeviceReading::validate`]; a
/// non-finite mean has no meaningful display level.
pub fn evaluate(
    reading: Option<&DeviceReading>,
    location_name: Option<&str>,
    device_id: &str,
) -> Option<AlertDecision> {
    let reading = reading?;
    let average = reading.average();

    Some(AlertDecision {
        should_alert: average < LOW_MOISTURE_THRESHOLD,
        average_moisture: round_percent(average),
        display_name: resolve_display_name(location_name, device_id),
    })
}

/// Pick the human-readable name for a device.
///
/// Blank location names fall back to the device id.
pub fn resolve_display_name(location_name: Option<&str>, device_id: &str) -> String {
    match location_name.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => device_id.to_string(),
    }
}

fn round_percent(value: f64) -> i32 {
    debug_assert!(value.is_finite(), "moisture mean must be finite, got {value}");
    // f64::round rounds half away from zero.
    value.round() as i32
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
