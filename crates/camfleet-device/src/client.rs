//! HTTPS client for one camera in COHN mode.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use camfleet_core::constants::{DEFAULT_REQUEST_TIMEOUT, DOWNLOAD_TIMEOUT, WAKE_UP_TIMEOUT};
use camfleet_core::{DeviceEndpoint, DownloadedFile, FleetError, FleetResult, MediaFile, RetryPolicy};
use reqwest::{Certificate, Client, Response};
use tokio::io::AsyncWriteExt;

use crate::catalog::{resolve_listing, MediaListResponse};
use crate::traits::CameraDevice;

const STATE_PATH: &str = "/gopro/camera/state";
const MEDIA_LIST_PATH: &str = "/gopro/media/list";
const SHUTTER_START_PATH: &str = "/gopro/camera/shutter/start";
const SHUTTER_STOP_PATH: &str = "/gopro/camera/shutter/stop";
const DELETE_ALL_PATH: &str = "/gp/gpControl/command/storage/delete/all";

/// The `settings` object of a camera state document, `{}` when absent.
pub fn settings_of(state: &serde_json::Value) -> serde_json::Value {
    state
        .get("settings")
        .cloned()
        .unwrap_or_else(|| serde_json::json!({}))
}

pub struct DeviceClient {
    endpoint: DeviceEndpoint,
    base_url: String,
    client: Client,
    retry: RetryPolicy,
}

impl DeviceClient {
    /// Build a client for `endpoint`.
    ///
    /// When the endpoint carries a PEM certificate it becomes the trust root for
    /// the camera's TLS channel; otherwise self-signed certificates are accepted.
    pub fn new(endpoint: DeviceEndpoint) -> FleetResult<Self> {
        let builder = Client::builder().timeout(DEFAULT_REQUEST_TIMEOUT);
        let builder = match endpoint.certificate() {
            Some(pem) => {
                let cert = Certificate::from_pem(pem.as_bytes()).map_err(|e| {
                    FleetError::config(format!(
                        "invalid certificate for camera {}: {}",
                        endpoint.id(),
                        e
                    ))
                })?;
                builder.add_root_certificate(cert)
            }
            None => builder.danger_accept_invalid_certs(true),
        };
        let client = builder.build().map_err(|e| {
            FleetError::config(format!(
                "failed to create HTTP client for camera {}: {}",
                endpoint.id(),
                e
            ))
        })?;

        Ok(Self {
            base_url: endpoint.base_url(),
            endpoint,
            client,
            retry: RetryPolicy::default(),
        })
    }

    /// Replace the retry policy used for capture commands.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn device(&self) -> String {
        self.endpoint.id().to_string()
    }

    async fn send(&self, path: &str, timeout: Option<Duration>) -> reqwest::Result<Response> {
        let mut request = self
            .client
            .get(self.build_url(path))
            .basic_auth(self.endpoint.username(), Some(self.endpoint.password()));
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        request.send().await
    }

    /// Issue a command and require a 2xx answer.
    async fn command(&self, command: &str, path: &str) -> FleetResult<Response> {
        let response = self
            .send(path, None)
            .await
            .map_err(|e| self.transport_error(command, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FleetError::CommandFailed {
                device: self.device(),
                command: command.to_string(),
                message: format!("HTTP {}: {}", status, body.trim()),
            });
        }
        Ok(response)
    }

    fn transport_error(&self, command: &str, err: reqwest::Error) -> FleetError {
        if err.is_timeout() {
            FleetError::Timeout {
                device: self.device(),
                message: err.to_string(),
            }
        } else if err.is_connect() {
            FleetError::Unreachable {
                device: self.device(),
                message: err.to_string(),
            }
        } else {
            FleetError::CommandFailed {
                device: self.device(),
                command: command.to_string(),
                message: err.to_string(),
            }
        }
    }

    fn catalog_error(&self, message: impl ToString) -> FleetError {
        FleetError::CatalogError {
            device: self.device(),
            message: message.to_string(),
        }
    }

    fn download_error(
        &self,
        name: &str,
        partial_path: Option<PathBuf>,
        message: impl ToString,
    ) -> FleetError {
        FleetError::DownloadError {
            device: self.device(),
            file: name.to_string(),
            partial_path,
            message: message.to_string(),
        }
    }

    /// Best-effort state probe so a dozing camera answers the next request.
    async fn wake_up(&self) {
        if let Err(e) = self.send(STATE_PATH, Some(WAKE_UP_TIMEOUT)).await {
            tracing::debug!(device = %self.id(), error = %e, "Wake-up probe failed, continuing");
        }
    }

    async fn shutter(&self, command: &'static str, path: &'static str) -> FleetResult<()> {
        let this = self;
        self.retry
            .run(command, move || async move {
                this.wake_up().await;
                this.command(command, path).await.map(|_| ())
            })
            .await?;
        tracing::info!(device = %self.id(), command = command, "Capture command accepted");
        Ok(())
    }
}

/// Reject names that would escape the destination directory.
fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && !name.contains(['/', '\\']) && !name.contains("..")
}

#[async_trait]
impl CameraDevice for DeviceClient {
    fn endpoint(&self) -> &DeviceEndpoint {
        &self.endpoint
    }

    async fn get_status(&self) -> FleetResult<serde_json::Value> {
        self.wake_up().await;
        let response = self.command("get status", STATE_PATH).await?;
        response
            .json()
            .await
            .map_err(|e| self.transport_error("get status", e))
    }

    async fn get_settings(&self) -> FleetResult<serde_json::Value> {
        Ok(settings_of(&self.get_status().await?))
    }

    async fn list_media(&self) -> FleetResult<Vec<MediaFile>> {
        self.wake_up().await;

        let response = self
            .send(MEDIA_LIST_PATH, None)
            .await
            .map_err(|e| self.catalog_error(e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(self.catalog_error(format!("HTTP {}", status)));
        }

        let bytes = response.bytes().await.map_err(|e| self.catalog_error(e))?;
        let listing: MediaListResponse = serde_json::from_slice(&bytes)
            .map_err(|e| self.catalog_error(format!("invalid media list: {}", e)))?;

        let files = resolve_listing(&listing);
        tracing::debug!(device = %self.id(), count = files.len(), "Media list resolved");
        Ok(files)
    }

    async fn start_capture(&self) -> FleetResult<()> {
        self.shutter("start capture", SHUTTER_START_PATH).await
    }

    async fn stop_capture(&self) -> FleetResult<()> {
        self.shutter("stop capture", SHUTTER_STOP_PATH).await
    }

    async fn download_file(
        &self,
        folder: &str,
        name: &str,
        destination_dir: &Path,
    ) -> FleetResult<DownloadedFile> {
        if !is_safe_file_name(name) {
            return Err(self.download_error(name, None, "invalid file name"));
        }

        tokio::fs::create_dir_all(destination_dir)
            .await
            .map_err(|e| {
                self.download_error(
                    name,
                    None,
                    format!("cannot create {}: {}", destination_dir.display(), e),
                )
            })?;

        let mut response = self
            .send(
                &format!("/videos/DCIM/{}/{}", folder, name),
                Some(DOWNLOAD_TIMEOUT),
            )
            .await
            .map_err(|e| self.download_error(name, None, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.download_error(name, None, format!("HTTP {}", status)));
        }

        let path = destination_dir.join(name);
        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(|e| self.download_error(name, None, e))?;

        let mut bytes_written: u64 = 0;
        loop {
            let chunk = response
                .chunk()
                .await
                .map_err(|e| self.download_error(name, Some(path.clone()), e))?;
            let Some(chunk) = chunk else { break };
            file.write_all(&chunk)
                .await
                .map_err(|e| self.download_error(name, Some(path.clone()), e))?;
            bytes_written += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| self.download_error(name, Some(path.clone()), e))?;

        tracing::info!(
            device = %self.id(),
            file = %name,
            bytes = bytes_written,
            "Downloaded file"
        );

        Ok(DownloadedFile {
            path,
            bytes_written,
        })
    }

    async fn delete_all(&self) -> FleetResult<()> {
        self.command("delete all", DELETE_ALL_PATH).await?;
        tracing::info!(device = %self.id(), "Deleted all media");
        Ok(())
    }

    async fn delete_file(&self, folder: &str, name: &str) -> FleetResult<()> {
        let path = format!("/gp/gpControl/command/storage/delete?p={}/{}", folder, name);
        self.command("delete file", &path).await?;
        tracing::debug!(device = %self.id(), folder = %folder, file = %name, "Deleted media file");
        Ok(())
    }

    async fn keep_alive(&self) {
        if let Err(e) = self.send(STATE_PATH, None).await {
            tracing::debug!(device = %self.id(), error = %e, "Keep-alive failed");
        }
    }
}
