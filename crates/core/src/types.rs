use crate::error::CoreError;

/// Field devices are addressed by their hardware identifier, e.g. `"DEV001"`.
pub type DeviceId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Longest accepted device identifier.
pub const MAX_DEVICE_ID_LEN: usize = 64;

/// Validate that a device id is non-blank and at most [`MAX_DEVICE_ID_LEN`] bytes.
pub fn validate_device_id(device_id: &str) -> Result<(), CoreError> {
    if device_id.trim().is_empty() {
        return Err(CoreError::Validation("device_id must not be blank".into()));
    }
    if device_id.len() > MAX_DEVICE_ID_LEN {
        return Err(CoreError::Validation(format!(
            "device_id must be at most {MAX_DEVICE_ID_LEN} characters"
        )));
    }
    Ok(())
}
