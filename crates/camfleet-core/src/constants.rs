//! Shared defaults for device access and local layout.

use std::time::Duration;

/// Default timeout for camera API requests.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for the best-effort wake-up probe sent before commands.
pub const WAKE_UP_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for a single media download (large video files).
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Capture start/stop attempts before the last error is surfaced.
pub const CAPTURE_MAX_ATTEMPTS: u32 = 3;

/// Fixed delay between capture command attempts.
pub const CAPTURE_RETRY_DELAY: Duration = Duration::from_millis(2000);

pub const DEFAULT_DEVICES_FILE: &str = "./cohn-config.json";
pub const DEFAULT_DOWNLOAD_DIR: &str = "./downloads";
pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_SMS_REGION: &str = "us-east-1";

/// Content type used for unrecognised extensions.
pub const GENERIC_CONTENT_TYPE: &str = "application/octet-stream";
