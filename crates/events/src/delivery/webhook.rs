//! Webhook notification delivery.
//!
//! [`WebhookDispatcher`] POSTs a JSON-encoded notification to an external
//! URL, typically a push gateway that fans it out to the farmer's phone.
//! Each notification gets exactly one attempt.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use kapruka_core::alert::NotificationRequest;

use crate::dispatch::{DispatchError, NotificationDispatcher};

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Delivers notifications to a webhook endpoint.
pub struct WebhookDispatcher {
    client: reqwest::Client,
    url: String,
}

impl WebhookDispatcher {
    /// Create a dispatcher for `url` with a pre-configured HTTP client.
    pub fn new(url: impl Into<String>) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn payload(request: &NotificationRequest) -> serde_json::Value {
        serde_json::json!({
            "title": request.title,
            "body": request.body,
            "data": request.metadata,
            "sent_at": Utc::now(),
        })
    }
}

#[async_trait]
impl NotificationDispatcher for WebhookDispatcher {
    fn channel(&self) -> &'static str {
        "webhook"
    }

    async fn notify(&self, request: &NotificationRequest) -> Result<(), DispatchError> {
        let response = self
            .client
            .post(&self.url)
            .json(&Self::payload(request))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DispatchError::HttpStatus(response.status().as_u16()));
        }

        tracing::debug!(url = %self.url, "Webhook notification delivered");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
