//! Configuration module
//!
//! Process settings come from environment variables (optionally seeded from a
//! `.env` file by the binary). The camera list comes from a JSON device file.
//! Any problem with either is a `ConfigInvalid` error and stops the process
//! before a camera is contacted.

use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::constants::{
    DEFAULT_DEVICES_FILE, DEFAULT_DOWNLOAD_DIR, DEFAULT_SMS_REGION, DEFAULT_SMTP_PORT,
};
use crate::error::{FleetError, FleetResult};
use crate::models::DeviceEndpoint;
use crate::storage_types::StorageBackend;

/// Remote archive configuration
///
/// Only checked when an upload is requested, so capture commands work on hosts
/// without archive credentials.
#[derive(Clone, Debug, Default)]
pub struct ArchiveConfig {
    pub backend: Option<StorageBackend>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub prefix: String,
    pub local_path: Option<String>,
}

impl ArchiveConfig {
    pub fn backend(&self) -> StorageBackend {
        self.backend.unwrap_or(StorageBackend::S3)
    }

    pub fn validate(&self) -> FleetResult<()> {
        match self.backend() {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(FleetError::config(
                        "AWS_S3_BUCKET must be set when using the S3 archive",
                    ));
                }
                if self.s3_region.is_none() {
                    return Err(FleetError::config(
                        "AWS_REGION must be set when using the S3 archive",
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_path.is_none() {
                    return Err(FleetError::config(
                        "LOCAL_ARCHIVE_PATH must be set when using the local archive",
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Failure notification configuration
#[derive(Clone, Debug, Default)]
pub struct NotificationConfig {
    pub enabled: bool,
    pub webhook_url: Option<String>,
    pub email_enabled: bool,
    pub email_to: Option<String>,
    pub email_from: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_tls: bool,
    pub sms_enabled: bool,
    pub phone_number: Option<String>,
    /// SNS region; AWS_REGION, else `us-east-1`.
    pub sms_region: String,
}

impl NotificationConfig {
    pub fn validate(&self) -> FleetResult<()> {
        if self.enabled && self.email_enabled {
            if self.email_to.is_none() || self.email_from.is_none() {
                return Err(FleetError::config(
                    "EMAIL_NOTIFICATIONS=true requires NOTIFICATION_EMAIL_TO and NOTIFICATION_EMAIL_FROM",
                ));
            }
            if self.smtp_host.is_none() {
                return Err(FleetError::config(
                    "EMAIL_NOTIFICATIONS=true requires SMTP_HOST to be set",
                ));
            }
        }
        if self.enabled && self.sms_enabled && self.phone_number.is_none() {
            return Err(FleetError::config(
                "SMS_NOTIFICATIONS=true requires NOTIFICATION_PHONE",
            ));
        }
        if let Some(url) = &self.webhook_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(FleetError::config(
                    "NOTIFICATION_WEBHOOK_URL must be an http(s) URL",
                ));
            }
        }
        Ok(())
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub devices_file: PathBuf,
    pub download_dir: PathBuf,
    pub cleanup_after_upload: bool,
    pub archive: ArchiveConfig,
    pub notifications: NotificationConfig,
}

impl Config {
    pub fn from_env() -> FleetResult<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup (the environment in production).
    pub fn from_vars<F>(var: F) -> FleetResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| var(key).filter(|s| !s.trim().is_empty());
        let flag = |key: &str, default: bool| {
            non_empty(key)
                .map(|s| s.trim().to_lowercase())
                .and_then(|s| s.parse().ok())
                .unwrap_or(default)
        };

        let backend = match non_empty("STORAGE_BACKEND") {
            Some(s) => Some(s.parse::<StorageBackend>().map_err(|e| FleetError::config(e.to_string()))?),
            None => None,
        };

        let smtp_port = match non_empty("SMTP_PORT") {
            Some(s) => s
                .trim()
                .parse::<u16>()
                .ok()
                .filter(|&p| p > 0)
                .ok_or_else(|| FleetError::config("SMTP_PORT must be a valid port number"))?,
            None => DEFAULT_SMTP_PORT,
        };

        let config = Config {
            devices_file: non_empty("CAMFLEET_DEVICES_FILE")
                .unwrap_or_else(|| DEFAULT_DEVICES_FILE.to_string())
                .into(),
            download_dir: non_empty("CAMFLEET_DOWNLOAD_DIR")
                .unwrap_or_else(|| DEFAULT_DOWNLOAD_DIR.to_string())
                .into(),
            cleanup_after_upload: flag("CAMFLEET_CLEANUP_AFTER_UPLOAD", false),
            archive: ArchiveConfig {
                backend,
                s3_bucket: non_empty("AWS_S3_BUCKET").or_else(|| non_empty("S3_BUCKET")),
                s3_region: non_empty("AWS_REGION").or_else(|| non_empty("S3_REGION")),
                s3_endpoint: non_empty("S3_ENDPOINT"),
                prefix: non_empty("AWS_S3_PREFIX").unwrap_or_default(),
                local_path: non_empty("LOCAL_ARCHIVE_PATH"),
            },
            notifications: NotificationConfig {
                enabled: flag("NOTIFICATIONS_ENABLED", false),
                webhook_url: non_empty("NOTIFICATION_WEBHOOK_URL"),
                email_enabled: flag("EMAIL_NOTIFICATIONS", false),
                email_to: non_empty("NOTIFICATION_EMAIL_TO"),
                email_from: non_empty("NOTIFICATION_EMAIL_FROM"),
                smtp_host: non_empty("SMTP_HOST"),
                smtp_port,
                smtp_user: non_empty("SMTP_USER"),
                smtp_password: non_empty("SMTP_PASSWORD"),
                smtp_tls: flag("SMTP_TLS", true),
                sms_enabled: flag("SMS_NOTIFICATIONS", false),
                phone_number: non_empty("NOTIFICATION_PHONE"),
                sms_region: non_empty("AWS_REGION").unwrap_or_else(|| DEFAULT_SMS_REGION.to_string()),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> FleetResult<()> {
        if self.download_dir.as_os_str().is_empty() {
            return Err(FleetError::config("CAMFLEET_DOWNLOAD_DIR must not be empty"));
        }
        self.notifications.validate()
    }
}

#[derive(Deserialize)]
struct DevicesFile {
    cameras: Option<Vec<DeviceEndpoint>>,
}

/// Load the camera list from the JSON device file.
///
/// Missing file, malformed JSON, a missing or empty `cameras` array, a record
/// without address or credentials, and duplicate identifiers are all fatal.
pub fn load_devices(path: &Path) -> FleetResult<Vec<DeviceEndpoint>> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        FleetError::config(format!(
            "cannot read device file {}: {} (run COHN provisioning first)",
            path.display(),
            e
        ))
    })?;
    parse_devices(&raw).map_err(|e| match e {
        FleetError::ConfigInvalid(msg) => {
            FleetError::config(format!("{}: {}", path.display(), msg))
        }
        other => other,
    })
}

pub fn parse_devices(raw: &str) -> FleetResult<Vec<DeviceEndpoint>> {
    let file: DevicesFile = serde_json::from_str(raw)
        .map_err(|e| FleetError::config(format!("malformed device file: {}", e)))?;

    let cameras = file
        .cameras
        .ok_or_else(|| FleetError::config("invalid device file format - missing 'cameras' array"))?;

    if cameras.is_empty() {
        return Err(FleetError::config("no cameras configured"));
    }

    let mut seen = HashSet::new();
    for camera in &cameras {
        if camera.ip_address().trim().is_empty() {
            return Err(FleetError::config("camera entry without ip_address"));
        }
        if camera.username().is_empty() || camera.password().is_empty() {
            return Err(FleetError::config(format!(
                "camera {} is missing credentials",
                camera.id()
            )));
        }
        if !seen.insert(camera.id().to_string()) {
            return Err(FleetError::config(format!(
                "duplicate camera identifier {}",
                camera.id()
            )));
        }
    }

    Ok(cameras)
}
