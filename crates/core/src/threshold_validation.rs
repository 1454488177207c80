//! Shared range-checking helpers for sensor values.

use crate::error::CoreError;

/// Lowest valid volumetric moisture percentage.
pub const MIN_PERCENT: f64 = 0.0;

/// Highest valid volumetric moisture percentage.
pub const MAX_PERCENT: f64 = 100.0;

/// Validate that a value is finite and falls within `[0.0, 100.0]`.
///
/// Returns a `CoreError::Validation` naming the field if out of range.
pub fn validate_percent(value: f64, name: &str) -> Result<(), CoreError> {
    if !value.is_finite() {
        return Err(CoreError::Validation(format!(
            "{name} must be a finite number, got {value}"
        )));
    }
    if !(MIN_PERCENT..=MAX_PERCENT).contains(&value) {
        return Err(CoreError::Validation(format!(
            "{name} must be between {MIN_PERCENT} and {MAX_PERCENT}, got {value}"
        )));
    }
    Ok(())
}
