//! SMTP email sink.

use async_trait::async_trait;
use camfleet_core::constants::DEFAULT_SMTP_PORT;
use camfleet_core::{FailureAlert, NotificationConfig};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;

use super::{AlertError, AlertSink};

#[derive(Clone)]
pub struct EmailSink {
    mailer: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

impl EmailSink {
    /// Build the sink from notification settings. Recipients may be a
    /// comma-separated list.
    pub fn from_config(config: &NotificationConfig) -> Result<Self, AlertError> {
        let host = config
            .smtp_host
            .as_deref()
            .ok_or_else(|| AlertError::Config("SMTP_HOST not configured".to_string()))?;
        let from: Mailbox = config
            .email_from
            .as_deref()
            .ok_or_else(|| AlertError::Config("NOTIFICATION_EMAIL_FROM not configured".to_string()))?
            .parse()
            .map_err(|e| AlertError::Config(format!("Invalid NOTIFICATION_EMAIL_FROM: {}", e)))?;
        let to = parse_recipients(config.email_to.as_deref().unwrap_or_default())?;
        let port = if config.smtp_port == 0 {
            DEFAULT_SMTP_PORT
        } else {
            config.smtp_port
        };

        let builder = if config.smtp_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| AlertError::Config(format!("Invalid SMTP_HOST: {}", e)))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        };
        let builder = builder.port(port);
        let builder = match (&config.smtp_user, &config.smtp_password) {
            (Some(user), Some(password)) => {
                builder.credentials(Credentials::new(user.clone(), password.clone()))
            }
            _ => builder,
        };

        tracing::info!(
            host = %host,
            port = port,
            tls = config.smtp_tls,
            recipients = to.len(),
            "Email sink initialized"
        );

        Ok(Self {
            mailer: Arc::new(builder.build()),
            from,
            to,
        })
    }

    pub fn recipients(&self) -> &[Mailbox] {
        &self.to
    }

    fn message(&self, alert: &FailureAlert) -> Result<Message, AlertError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(alert.subject());
        for mailbox in &self.to {
            builder = builder.to(mailbox.clone());
        }
        builder
            .header(ContentType::TEXT_PLAIN)
            .body(alert.body())
            .map_err(|e| AlertError::Email(e.to_string()))
    }
}

fn parse_recipients(raw: &str) -> Result<Vec<Mailbox>, AlertError> {
    let recipients = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<Mailbox>()
                .map_err(|e| AlertError::Config(format!("Invalid recipient '{}': {}", s, e)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if recipients.is_empty() {
        return Err(AlertError::Config(
            "NOTIFICATION_EMAIL_TO has no recipients".to_string(),
        ));
    }
    Ok(recipients)
}

#[async_trait]
impl AlertSink for EmailSink {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn dispatch(&self, alert: &FailureAlert) -> Result<(), AlertError> {
        let email = self.message(alert)?;
        self.mailer
            .send(email)
            .await
            .map_err(|e| AlertError::Email(e.to_string()))?;
        tracing::info!(count = self.to.len(), "Alert email sent");
        Ok(())
    }
}
