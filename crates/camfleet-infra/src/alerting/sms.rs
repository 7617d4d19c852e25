//! SMS sink publishing through AWS SNS.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_sns::Client as SnsClient;
use camfleet_core::constants::DEFAULT_SMS_REGION;
use camfleet_core::{FailureAlert, NotificationConfig};
use tokio::sync::OnceCell;

use super::{AlertError, AlertSink};

pub struct SmsSink {
    phone_number: String,
    region: String,
    /// Built on first delivery; loading AWS credentials needs the runtime.
    client: OnceCell<SnsClient>,
}

impl SmsSink {
    pub fn from_config(config: &NotificationConfig) -> Result<Self, AlertError> {
        let phone_number = config
            .phone_number
            .clone()
            .ok_or_else(|| AlertError::Config("NOTIFICATION_PHONE not configured".to_string()))?;
        let region = if config.sms_region.is_empty() {
            DEFAULT_SMS_REGION.to_string()
        } else {
            config.sms_region.clone()
        };

        tracing::info!(region = %region, "SMS sink initialized");
        Ok(Self {
            phone_number,
            region,
            client: OnceCell::new(),
        })
    }

    /// Use an already configured client.
    pub fn with_client(client: SnsClient, phone_number: impl Into<String>) -> Self {
        Self {
            phone_number: phone_number.into(),
            region: String::new(),
            client: OnceCell::new_with(Some(client)),
        }
    }

    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    async fn client(&self) -> &SnsClient {
        self.client
            .get_or_init(|| async {
                let config = aws_config::defaults(BehaviorVersion::latest())
                    .region(aws_config::Region::new(self.region.clone()))
                    .load()
                    .await;
                SnsClient::new(&config)
            })
            .await
    }
}

/// Subject line followed by the shared plain-text body.
pub fn sms_text(alert: &FailureAlert) -> String {
    format!("{}\n{}", alert.subject(), alert.body())
}

#[async_trait]
impl AlertSink for SmsSink {
    fn name(&self) -> &'static str {
        "sms"
    }

    async fn dispatch(&self, alert: &FailureAlert) -> Result<(), AlertError> {
        let output = self
            .client()
            .await
            .publish()
            .phone_number(&self.phone_number)
            .message(sms_text(alert))
            .send()
            .await
            .map_err(|e| AlertError::Sms(aws_sdk_sns::error::DisplayErrorContext(e).to_string()))?;

        tracing::info!(
            action = %alert.action,
            message_id = output.message_id().unwrap_or_default(),
            "SMS alert sent"
        );
        Ok(())
    }
}
