//! camfleet Core Library
//!
//! This crate provides the domain models, error taxonomy, configuration and retry
//! policy shared by every camfleet component: the device client, the remote
//! archive, the alerting sinks and the fleet services.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod retry;
pub mod storage_types;

// Re-export commonly used types
pub use config::{load_devices, ArchiveConfig, Config, NotificationConfig};
pub use error::{FleetError, FleetResult, LogLevel};
pub use models::{
    DeviceEndpoint, DeviceFailure, DownloadedFile, FailureAlert, MediaFile, OperationOutcome,
};
pub use retry::RetryPolicy;
pub use storage_types::StorageBackend;
