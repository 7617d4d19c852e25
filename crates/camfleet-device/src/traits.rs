//! Device abstraction trait

use async_trait::async_trait;
use camfleet_core::{DeviceEndpoint, DownloadedFile, FleetResult, MediaFile};
use std::path::Path;

/// Operations the fleet services issue to one camera.
///
/// Every error carries the device identifier.
#[async_trait]
pub trait CameraDevice: Send + Sync {
    fn endpoint(&self) -> &DeviceEndpoint;

    fn id(&self) -> &str {
        self.endpoint().id()
    }

    /// Wake-up probe followed by the camera state document.
    async fn get_status(&self) -> FleetResult<serde_json::Value>;

    /// The `settings` section of the camera state.
    async fn get_settings(&self) -> FleetResult<serde_json::Value>;

    /// Flattened media catalog, grouped captures expanded.
    async fn list_media(&self) -> FleetResult<Vec<MediaFile>>;

    /// Start capture, retried with the client's retry policy.
    async fn start_capture(&self) -> FleetResult<()>;

    /// Stop capture, retried with the client's retry policy.
    async fn stop_capture(&self) -> FleetResult<()>;

    /// Stream one file into `destination_dir`, creating the directory if needed.
    async fn download_file(
        &self,
        folder: &str,
        name: &str,
        destination_dir: &Path,
    ) -> FleetResult<DownloadedFile>;

    /// Delete every file on the camera. Never retried.
    async fn delete_all(&self) -> FleetResult<()>;

    /// Delete one file on the camera. Never retried.
    async fn delete_file(&self, folder: &str, name: &str) -> FleetResult<()>;

    /// Best-effort poke that keeps the camera awake. Never fails.
    async fn keep_alive(&self);
}
