pub mod alert;
pub mod device;
pub mod media;
pub mod outcome;

pub use alert::{DeviceFailure, FailureAlert};
pub use device::DeviceEndpoint;
pub use media::{DownloadedFile, MediaFile};
pub use outcome::OperationOutcome;
