//! In-memory fakes for fleet and pipeline tests.

#![allow(dead_code)]

use async_trait::async_trait;
use camfleet_core::{
    DeviceEndpoint, DownloadedFile, FailureAlert, FleetError, FleetResult, MediaFile,
};
use camfleet_device::CameraDevice;
use camfleet_infra::{AlertError, AlertSink};
use camfleet_services::{LocalFiles, TokioLocalFiles};
use camfleet_storage::{Storage, StorageBackend, StorageError, StorageResult};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Scripted camera.
pub struct FakeDevice {
    endpoint: DeviceEndpoint,
    media: Vec<(MediaFile, Vec<u8>)>,
    unreachable: bool,
    failing_downloads: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeDevice {
    pub fn new(ip: &str) -> Self {
        Self {
            endpoint: DeviceEndpoint::new(ip, "gopro", "secret"),
            media: Vec::new(),
            unreachable: false,
            failing_downloads: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every operation fails with `Unreachable`.
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    pub fn with_file(self, name: &str, data: &[u8]) -> Self {
        self.with_file_in("100GOPRO", name, data)
    }

    pub fn with_file_in(mut self, folder: &str, name: &str, data: &[u8]) -> Self {
        self.media
            .push((media_file(folder, name, data.len() as u64), data.to_vec()));
        self
    }

    /// Camera reports `reported_size` but serves `data`.
    pub fn with_file_reporting(mut self, name: &str, data: &[u8], reported_size: u64) -> Self {
        self.media
            .push((media_file("100GOPRO", name, reported_size), data.to_vec()));
        self
    }

    pub fn failing_download(mut self, name: &str) -> Self {
        self.failing_downloads.insert(name.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &str) -> FleetResult<()> {
        self.calls.lock().unwrap().push(call.to_string());
        if self.unreachable {
            return Err(FleetError::Unreachable {
                device: self.endpoint.id().to_string(),
                message: "connection refused".to_string(),
            });
        }
        Ok(())
    }
}

fn media_file(folder: &str, name: &str, size: u64) -> MediaFile {
    MediaFile {
        folder: folder.to_string(),
        name: name.to_string(),
        size,
        created: "1700000000".to_string(),
        group_id: None,
        group_member_id: None,
    }
}

#[async_trait]
impl CameraDevice for FakeDevice {
    fn endpoint(&self) -> &DeviceEndpoint {
        &self.endpoint
    }

    async fn get_status(&self) -> FleetResult<serde_json::Value> {
        self.record("status")?;
        Ok(serde_json::json!({"status": {}, "settings": {}}))
    }

    async fn get_settings(&self) -> FleetResult<serde_json::Value> {
        self.record("settings")?;
        Ok(serde_json::json!({}))
    }

    async fn list_media(&self) -> FleetResult<Vec<MediaFile>> {
        self.record("list")?;
        Ok(self.media.iter().map(|(file, _)| file.clone()).collect())
    }

    async fn start_capture(&self) -> FleetResult<()> {
        self.record("start")
    }

    async fn stop_capture(&self) -> FleetResult<()> {
        self.record("stop")
    }

    async fn download_file(
        &self,
        folder: &str,
        name: &str,
        destination_dir: &Path,
    ) -> FleetResult<DownloadedFile> {
        self.record(&format!("download {}", name))?;
        if self.failing_downloads.contains(name) {
            return Err(FleetError::DownloadError {
                device: self.endpoint.id().to_string(),
                file: name.to_string(),
                partial_path: None,
                message: "connection reset".to_string(),
            });
        }
        let (_, data) = self
            .media
            .iter()
            .find(|(file, _)| file.folder == folder && file.name == name)
            .expect("download of unknown file");
        std::fs::create_dir_all(destination_dir).unwrap();
        let path = destination_dir.join(name);
        std::fs::write(&path, data).unwrap();
        Ok(DownloadedFile {
            path,
            bytes_written: data.len() as u64,
        })
    }

    async fn delete_all(&self) -> FleetResult<()> {
        self.record("delete all")
    }

    async fn delete_file(&self, _folder: &str, name: &str) -> FleetResult<()> {
        self.record(&format!("delete {}", name))
    }

    async fn keep_alive(&self) {
        let _ = self.record("keep alive");
    }
}

/// Captures every dispatched alert.
#[derive(Default)]
pub struct RecordingSink {
    alerts: Mutex<Vec<FailureAlert>>,
    fail: bool,
}

impl RecordingSink {
    pub fn failing() -> Self {
        Self {
            alerts: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn alerts(&self) -> Vec<FailureAlert> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertSink for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn dispatch(&self, alert: &FailureAlert) -> Result<(), AlertError> {
        self.alerts.lock().unwrap().push(alert.clone());
        if self.fail {
            return Err(AlertError::Webhook("HTTP 502".to_string()));
        }
        Ok(())
    }
}

/// Archive kept in memory. Keys containing a `fail_on` marker are rejected.
#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
    fail_on: Option<String>,
}

impl MemoryStorage {
    pub fn failing_on(marker: &str) -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            fail_on: Some(marker.to_string()),
        }
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(_, content_type)| content_type.clone())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn put_file(&self, key: &str, source: &Path, content_type: &str) -> StorageResult<String> {
        if let Some(marker) = &self.fail_on {
            if key.contains(marker.as_str()) {
                return Err(StorageError::UploadFailed("access denied".to_string()));
            }
        }
        let data = std::fs::read(source)?;
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (data, content_type.to_string()));
        Ok(format!("memory://{}", key))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

/// Real filesystem access that counts deletions.
#[derive(Default)]
pub struct CountingLocalFiles {
    inner: TokioLocalFiles,
    removed_files: AtomicUsize,
}

impl CountingLocalFiles {
    pub fn removed_files(&self) -> usize {
        self.removed_files.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocalFiles for CountingLocalFiles {
    async fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        self.inner.list_files(dir).await
    }

    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.removed_files.fetch_add(1, Ordering::SeqCst);
        self.inner.remove_file(path).await
    }

    async fn remove_dir(&self, dir: &Path) -> io::Result<()> {
        self.inner.remove_dir(dir).await
    }

    async fn remove_dir_all(&self, dir: &Path) -> io::Result<()> {
        self.inner.remove_dir_all(dir).await
    }
}
