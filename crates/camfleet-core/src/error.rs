//! Error types module
//!
//! Every failure a fleet operation can produce is one `FleetError` variant.
//! All variants except `ConfigInvalid` belong to a single device and carry its
//! identifier, so the coordinator can downgrade them to a failed outcome for
//! that device and correlate them in the batched alert.
//! `ConfigInvalid` is raised before any device is contacted and is fatal.

use std::path::PathBuf;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected conditions such as an operator typo in the config
    Debug,
    /// Transient device conditions (sleeping or unreachable camera)
    Warn,
    /// Unexpected failures
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FleetError {
    #[error("Cannot connect to camera {device}: {message}")]
    Unreachable { device: String, message: String },

    #[error("Connection to camera {device} timed out (camera may be sleeping): {message}")]
    Timeout { device: String, message: String },

    #[error("Command '{command}' failed on camera {device}: {message}")]
    CommandFailed {
        device: String,
        command: String,
        message: String,
    },

    #[error("Failed to get media list from camera {device}: {message}")]
    CatalogError { device: String, message: String },

    #[error("Failed to download {file} from camera {device}: {message}")]
    DownloadError {
        device: String,
        file: String,
        /// Local file left behind by the failed transfer, if one was created.
        partial_path: Option<PathBuf>,
        message: String,
    },

    #[error("Failed to upload {file} for camera {device}: {message}")]
    UploadError {
        device: String,
        file: String,
        message: String,
    },

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
}

/// Result type for fleet operations
pub type FleetResult<T> = Result<T, FleetError>;

impl FleetError {
    pub fn config(message: impl Into<String>) -> Self {
        FleetError::ConfigInvalid(message.into())
    }

    /// Identifier of the device the error belongs to. `None` for configuration errors.
    pub fn device_id(&self) -> Option<&str> {
        match self {
            FleetError::Unreachable { device, .. }
            | FleetError::Timeout { device, .. }
            | FleetError::CommandFailed { device, .. }
            | FleetError::CatalogError { device, .. }
            | FleetError::DownloadError { device, .. }
            | FleetError::UploadError { device, .. } => Some(device),
            FleetError::ConfigInvalid(_) => None,
        }
    }

    /// Machine-readable error code (e.g. "UNREACHABLE")
    pub fn error_code(&self) -> &'static str {
        match self {
            FleetError::Unreachable { .. } => "UNREACHABLE",
            FleetError::Timeout { .. } => "TIMEOUT",
            FleetError::CommandFailed { .. } => "COMMAND_FAILED",
            FleetError::CatalogError { .. } => "CATALOG_ERROR",
            FleetError::DownloadError { .. } => "DOWNLOAD_ERROR",
            FleetError::UploadError { .. } => "UPLOAD_ERROR",
            FleetError::ConfigInvalid(_) => "CONFIG_INVALID",
        }
    }

    /// Whether a later run of the same operation may succeed.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, FleetError::ConfigInvalid(_))
    }

    pub fn log_level(&self) -> LogLevel {
        match self {
            FleetError::Unreachable { .. } | FleetError::Timeout { .. } => LogLevel::Warn,
            FleetError::ConfigInvalid(_) => LogLevel::Debug,
            _ => LogLevel::Error,
        }
    }
}
