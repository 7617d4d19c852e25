//! Operator alerting
//!
//! A failing fan-out produces exactly one `FailureAlert`, which the coordinator
//! hands to an `AlertSink`. Sinks are built once from configuration and
//! injected; nothing here is global. Delivery problems are returned to the
//! caller, which logs them and carries on: an alert that cannot be delivered
//! never changes the outcome of the operation it reports on.

#[cfg(feature = "email")]
pub mod email;
#[cfg(feature = "sms")]
pub mod sms;
#[cfg(feature = "webhook")]
pub mod webhook;

use std::sync::Arc;

use async_trait::async_trait;
use camfleet_core::{FailureAlert, NotificationConfig};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("Webhook delivery failed: {0}")]
    Webhook(String),

    #[error("Email delivery failed: {0}")]
    Email(String),

    #[error("SMS delivery failed: {0}")]
    Sms(String),

    #[error("Alert sink misconfigured: {0}")]
    Config(String),

    #[error("{failed} of {total} alert sinks failed: {message}")]
    Partial {
        failed: usize,
        total: usize,
        message: String,
    },
}

/// Destination for batched failure alerts.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Short name used in logs ("log", "webhook", "email", "sms").
    fn name(&self) -> &'static str;

    async fn dispatch(&self, alert: &FailureAlert) -> Result<(), AlertError>;
}

/// Writes alerts to the tracing pipeline. Always present.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl AlertSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn dispatch(&self, alert: &FailureAlert) -> Result<(), AlertError> {
        for failure in &alert.failures {
            tracing::error!(
                action = %alert.action,
                device = %failure.device_id,
                error = %failure.error,
                "Camera operation failed"
            );
        }
        tracing::warn!(
            action = %alert.action,
            failed_devices = alert.failures.len(),
            "{}",
            alert.subject()
        );
        Ok(())
    }
}

/// Fans one alert out to several sinks concurrently.
pub struct CompositeSink {
    sinks: Vec<Arc<dyn AlertSink>>,
}

impl CompositeSink {
    pub fn new(sinks: Vec<Arc<dyn AlertSink>>) -> Self {
        Self { sinks }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn sink_names(&self) -> Vec<&'static str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }
}

#[async_trait]
impl AlertSink for CompositeSink {
    fn name(&self) -> &'static str {
        "composite"
    }

    async fn dispatch(&self, alert: &FailureAlert) -> Result<(), AlertError> {
        let results =
            futures::future::join_all(self.sinks.iter().map(|sink| sink.dispatch(alert))).await;

        let errors: Vec<String> = self
            .sinks
            .iter()
            .zip(results)
            .filter_map(|(sink, result)| {
                result.err().map(|e| {
                    tracing::warn!(sink = sink.name(), error = %e, "Alert sink failed");
                    format!("{}: {}", sink.name(), e)
                })
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AlertError::Partial {
                failed: errors.len(),
                total: self.sinks.len(),
                message: errors.join("; "),
            })
        }
    }
}

/// Build the sink set described by `config`.
///
/// The log sink is always included. Webhook, email and SMS sinks are added
/// only when notifications are enabled.
pub fn build_alert_sink(config: &NotificationConfig) -> Result<Arc<dyn AlertSink>, AlertError> {
    let mut sinks: Vec<Arc<dyn AlertSink>> = vec![Arc::new(LogSink)];

    if !config.enabled {
        tracing::debug!("Notifications disabled (NOTIFICATIONS_ENABLED=false)");
        return Ok(Arc::new(CompositeSink::new(sinks)));
    }

    if let Some(url) = &config.webhook_url {
        #[cfg(feature = "webhook")]
        sinks.push(Arc::new(webhook::WebhookSink::new(url.clone())?));
        #[cfg(not(feature = "webhook"))]
        return Err(AlertError::Config(format!(
            "webhook sink for {} not available (webhook feature not enabled)",
            url
        )));
    }

    if config.email_enabled {
        #[cfg(feature = "email")]
        sinks.push(Arc::new(email::EmailSink::from_config(config)?));
        #[cfg(not(feature = "email"))]
        return Err(AlertError::Config(
            "email sink not available (email feature not enabled)".to_string(),
        ));
    }

    if config.sms_enabled {
        #[cfg(feature = "sms")]
        sinks.push(Arc::new(sms::SmsSink::from_config(config)?));
        #[cfg(not(feature = "sms"))]
        return Err(AlertError::Config(
            "SMS sink not available (sms feature not enabled)".to_string(),
        ));
    }

    let composite = CompositeSink::new(sinks);
    tracing::info!(sinks = ?composite.sink_names(), "Alert sinks configured");
    Ok(Arc::new(composite))
}
