//! Handlers for device moisture endpoints.
//!
//! - `check_moisture` evaluates a reading synchronously and dispatches an
//!   alert when needed.
//! - `submit_reading` hands the report to the background monitor.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use kapruka_core::moisture::DeviceReading;
use kapruka_core::types::validate_device_id;
use kapruka_events::{CheckOutcome, DeviceReport};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Moisture percentages at the three probe depths.
#[derive(Debug, Deserialize, Validate)]
pub struct ReadingInput {
    #[validate(range(min = 0.0, max = 100.0))]
    pub moisture_10cm: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub moisture_20cm: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub moisture_30cm: f64,
}

impl From<&ReadingInput> for DeviceReading {
    fn from(input: &ReadingInput) -> Self {
        DeviceReading::new(input.moisture_10cm, input.moisture_20cm, input.moisture_30cm)
    }
}

/// Request body shared by both device endpoints.
///
/// `reading` is omitted (or `null`) for a device that has not reported yet.
#[derive(Debug, Deserialize, Validate)]
pub struct DeviceReadingRequest {
    #[validate(nested)]
    pub reading: Option<ReadingInput>,
    #[validate(length(max = 120))]
    pub location_name: Option<String>,
}

impl DeviceReadingRequest {
    /// Validate the body and convert the reading into its domain type.
    fn into_reading(self) -> AppResult<(Option<DeviceReading>, Option<String>)> {
        self.validate()?;
        let reading = self.reading.as_ref().map(DeviceReading::from);
        if let Some(reading) = &reading {
            reading.validate()?;
        }
        Ok((reading, self.location_name))
    }
}

/// Acknowledgement for a queued report.
#[derive(Debug, Serialize)]
pub struct ReportAccepted {
    pub device_id: String,
    /// Whether a monitor was listening when the report was published.
    pub queued: bool,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /devices/{device_id}/moisture-check
///
/// Evaluate the reading now. Responds with the decision and whether an
/// alert was dispatched; a failed dispatch is reported as `alerted: false`
/// rather than an error.
pub async fn check_moisture(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    Json(body): Json<DeviceReadingRequest>,
) -> AppResult<Json<DataResponse<CheckOutcome>>> {
    validate_device_id(&device_id)?;
    let (reading, location_name) = body.into_reading()?;

    let outcome = state
        .monitor
        .check(reading.as_ref(), location_name.as_deref(), &device_id)
        .await;

    Ok(Json(DataResponse { data: outcome }))
}

/// POST /devices/{device_id}/readings
///
/// Publish a report for the background monitor and return immediately.
pub async fn submit_reading(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    Json(body): Json<DeviceReadingRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<ReportAccepted>>)> {
    validate_device_id(&device_id)?;
    let (reading, location_name) = body.into_reading()?;

    let report = DeviceReport {
        device_id: device_id.clone(),
        location_name,
        reading,
        reported_at: Utc::now(),
    };

    let queued = state.report_bus.publish(report) > 0;
    if !queued {
        tracing::warn!(device_id = %device_id, "No moisture monitor running, report dropped");
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: ReportAccepted { device_id, queued },
        }),
    ))
}
