use crate::error::FleetError;

/// Result of one fan-out operation on one device.
#[derive(Debug, Clone)]
pub struct OperationOutcome<T> {
    pub device_id: String,
    pub result: Result<T, FleetError>,
}

impl<T> OperationOutcome<T> {
    pub fn new(device_id: impl Into<String>, result: Result<T, FleetError>) -> Self {
        Self {
            device_id: device_id.into(),
            result,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }

    pub fn value(&self) -> Option<&T> {
        self.result.as_ref().ok()
    }

    pub fn error(&self) -> Option<&FleetError> {
        self.result.as_ref().err()
    }
}
