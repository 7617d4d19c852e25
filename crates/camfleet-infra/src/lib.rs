//! camfleet Infrastructure Library
//!
//! Shared infrastructure for the fleet services and the CLI:
//! - Alert delivery (log, webhook, SMTP and SNS sinks behind one trait)
//! - Telemetry initialization

pub mod alerting;

#[cfg(feature = "observability-basic")]
pub mod telemetry;

// Re-export commonly used types
pub use alerting::{build_alert_sink, AlertError, AlertSink, CompositeSink, LogSink};

#[cfg(feature = "email")]
pub use alerting::email::EmailSink;
#[cfg(feature = "sms")]
pub use alerting::sms::SmsSink;
#[cfg(feature = "webhook")]
pub use alerting::webhook::WebhookSink;

#[cfg(feature = "observability-basic")]
pub use telemetry::{init_telemetry, LogFormat};
