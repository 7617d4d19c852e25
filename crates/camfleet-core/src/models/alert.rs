use chrono::{DateTime, Utc};
use serde::Serialize;

/// One failing device inside a batched alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceFailure {
    pub device_id: String,
    pub error: String,
}

/// Batched failure report for a single fan-out.
///
/// One alert is built per failing operation, never one per device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureAlert {
    pub action: String,
    pub timestamp: DateTime<Utc>,
    pub failures: Vec<DeviceFailure>,
}

impl FailureAlert {
    pub fn new(action: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            action: action.into(),
            timestamp,
            failures: Vec::new(),
        }
    }

    pub fn push(&mut self, device_id: impl Into<String>, error: impl Into<String>) {
        self.failures.push(DeviceFailure {
            device_id: device_id.into(),
            error: error.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// The device identifier when exactly one device failed.
    pub fn device_id(&self) -> Option<&str> {
        match self.failures.as_slice() {
            [only] => Some(&only.device_id),
            _ => None,
        }
    }

    pub fn subject(&self) -> String {
        format!("Camera fleet error: {}", self.action)
    }

    /// Plain-text rendering shared by every sink.
    pub fn body(&self) -> String {
        let mut message = String::from("Camera fleet error alert\n\n");
        message.push_str(&format!(
            "Time: {}\n",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        message.push_str(&format!("Action: {}\n", self.action));
        if let Some(device) = self.device_id() {
            message.push_str(&format!("Camera: {}\n", device));
        } else {
            message.push_str(&format!("Failed cameras: {}\n", self.failures.len()));
        }
        message.push_str("\nErrors:\n");
        for failure in &self.failures {
            message.push_str(&format!("- {}: {}\n", failure.device_id, failure.error));
        }
        message
    }
}
