//! HTTP webhook sink.
//!
//! Posts one JSON document per alert: `subject` and `message` for receivers
//! that only show text, plus the structured `alert` itself.

use std::time::Duration;

use async_trait::async_trait;
use camfleet_core::FailureAlert;
use reqwest::Client;
use serde_json::json;

use super::{AlertError, AlertSink};

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

pub struct WebhookSink {
    client: Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: String) -> Result<Self, AlertError> {
        let client = Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .map_err(|e| AlertError::Config(format!("failed to create webhook client: {}", e)))?;

        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl AlertSink for WebhookSink {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn dispatch(&self, alert: &FailureAlert) -> Result<(), AlertError> {
        let payload = json!({
            "subject": alert.subject(),
            "message": alert.body(),
            "alert": alert,
        });

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AlertError::Webhook(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AlertError::Webhook(format!("HTTP {}", status)));
        }

        tracing::info!(
            failed_devices = alert.failures.len(),
            "Webhook notification sent"
        );
        Ok(())
    }
}
