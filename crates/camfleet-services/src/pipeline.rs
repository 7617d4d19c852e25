//! Download → upload → cleanup, per camera.
//!
//! Stages run strictly in order for one camera; cameras run concurrently.
//! Local files are deleted only after every one of them reached the archive,
//! and only the files of that batch are deleted. A failed download or upload
//! leaves the local directory exactly as it is.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use camfleet_core::{DownloadedFile, FleetError, FleetResult, OperationOutcome};
use camfleet_device::CameraDevice;
use camfleet_storage::{ArchiveUploader, ArchivedObject};
use futures::future::join_all;

use crate::fleet::{FleetCoordinator, FleetReport};
use crate::local_files::{LocalFiles, TokioLocalFiles};

/// Per-camera pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    Pending,
    Downloading,
    Downloaded,
    DownloadFailed,
    Uploading,
    Uploaded,
    UploadFailed,
    /// Uploaded and the local copies were removed.
    Cleaned,
    /// Uploaded, cleanup disabled.
    Done,
}

impl TransferState {
    pub fn can_advance_to(self, next: TransferState) -> bool {
        use TransferState::*;
        matches!(
            (self, next),
            (Pending, Downloading)
                | (Downloading, Downloaded)
                | (Downloading, DownloadFailed)
                | (Downloaded, Uploading)
                | (Uploading, Uploaded)
                | (Uploading, UploadFailed)
                | (Uploaded, Cleaned)
                | (Uploaded, Done)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TransferState::DownloadFailed
                | TransferState::UploadFailed
                | TransferState::Cleaned
                | TransferState::Done
        )
    }

    pub fn is_success(self) -> bool {
        matches!(self, TransferState::Cleaned | TransferState::Done)
    }
}

#[derive(Debug, Clone)]
pub struct TransferRecord {
    pub device_id: String,
    pub state: TransferState,
    pub local_dir: PathBuf,
    pub downloaded: Vec<DownloadedFile>,
    /// Files whose byte count on disk differs from the size the camera reported.
    pub size_mismatches: Vec<String>,
    pub uploaded: Vec<ArchivedObject>,
    pub cleaned: usize,
    pub error: Option<FleetError>,
}

impl TransferRecord {
    fn new(device_id: String, local_dir: PathBuf) -> Self {
        Self {
            device_id,
            state: TransferState::Pending,
            local_dir,
            downloaded: Vec::new(),
            size_mismatches: Vec::new(),
            uploaded: Vec::new(),
            cleaned: 0,
            error: None,
        }
    }

    fn advance(&mut self, next: TransferState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "invalid transfer transition {:?} -> {:?}",
            self.state,
            next
        );
        tracing::debug!(device = %self.device_id, from = ?self.state, to = ?next, "Transfer state change");
        self.state = next;
    }

    fn fail(&mut self, next: TransferState, error: FleetError) {
        self.advance(next);
        self.error = Some(error);
    }

    /// Number of archived files on success; the stopping error otherwise.
    pub fn outcome(&self) -> OperationOutcome<usize> {
        let result = match &self.error {
            Some(e) => Err(e.clone()),
            None => Ok(self.uploaded.len()),
        };
        OperationOutcome::new(self.device_id.clone(), result)
    }
}

/// Files fetched from one camera by the download stage.
#[derive(Debug, Clone, Default)]
pub struct DownloadBatch {
    pub files: Vec<DownloadedFile>,
    pub size_mismatches: Vec<String>,
}

#[derive(Debug)]
pub struct TransferSummary {
    pub records: Vec<TransferRecord>,
    pub report: FleetReport<usize>,
}

impl TransferSummary {
    pub fn succeeded(&self) -> bool {
        self.report.succeeded()
    }

    pub fn files_uploaded(&self) -> usize {
        self.records.iter().map(|r| r.uploaded.len()).sum()
    }

    pub fn devices_succeeded(&self) -> usize {
        self.records.iter().filter(|r| r.state.is_success()).count()
    }
}

pub struct TransferPipeline {
    archive: Option<ArchiveUploader>,
    local: Arc<dyn LocalFiles>,
    download_dir: PathBuf,
    cleanup_after_upload: bool,
}

impl TransferPipeline {
    pub fn new(
        archive: ArchiveUploader,
        download_dir: impl Into<PathBuf>,
        cleanup_after_upload: bool,
    ) -> Self {
        Self {
            archive: Some(archive),
            local: Arc::new(TokioLocalFiles),
            download_dir: download_dir.into(),
            cleanup_after_upload,
        }
    }

    /// Download and local cleanup only. Every upload fails with `ConfigInvalid`.
    pub fn without_archive(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            archive: None,
            local: Arc::new(TokioLocalFiles),
            download_dir: download_dir.into(),
            cleanup_after_upload: false,
        }
    }

    pub fn with_local_files(mut self, local: Arc<dyn LocalFiles>) -> Self {
        self.local = local;
        self
    }

    /// `{download_dir}/{address with '.' replaced by '_'}`
    pub fn device_dir(&self, device: &dyn CameraDevice) -> PathBuf {
        self.download_dir
            .join(device.endpoint().local_dir_name())
    }

    /// Fetch every file on the camera into its local directory.
    ///
    /// A failed file does not stop the rest, but the stage fails with the
    /// first error. Partial files stay on disk. Files share one flat
    /// directory, so a name already taken by another folder is not downloaded
    /// and fails the stage instead of overwriting the earlier copy.
    pub async fn download_device(&self, device: &dyn CameraDevice) -> FleetResult<DownloadBatch> {
        let dir = self.device_dir(device);
        let files = device.list_media().await?;

        tracing::info!(device = %device.id(), files = files.len(), dir = %dir.display(), "Downloading media");

        let mut batch = DownloadBatch::default();
        let mut first_error = None;
        let mut failed = 0usize;
        let mut taken: HashMap<&str, &str> = HashMap::new();

        for file in &files {
            if let Some(folder) = taken.insert(file.name.as_str(), file.folder.as_str()) {
                tracing::error!(
                    device = %device.id(),
                    file = %file.name,
                    folder = %file.folder,
                    first_folder = %folder,
                    "File name already downloaded from another folder"
                );
                failed += 1;
                first_error.get_or_insert(FleetError::DownloadError {
                    device: device.id().to_string(),
                    file: file.remote_path(),
                    partial_path: None,
                    message: format!(
                        "name collides with {}/{} in {}",
                        folder,
                        file.name,
                        dir.display()
                    ),
                });
                continue;
            }
            match device.download_file(&file.folder, &file.name, &dir).await {
                Ok(downloaded) => {
                    if downloaded.size_mismatch(file) {
                        tracing::warn!(
                            device = %device.id(),
                            file = %file.name,
                            expected_bytes = file.size,
                            written_bytes = downloaded.bytes_written,
                            "Downloaded size differs from reported size"
                        );
                        batch.size_mismatches.push(file.name.clone());
                    }
                    batch.files.push(downloaded);
                }
                Err(e) => {
                    tracing::error!(device = %device.id(), file = %file.name, error = %e, "Download failed");
                    failed += 1;
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => {
                tracing::error!(
                    device = %device.id(),
                    failed = failed,
                    downloaded = batch.files.len(),
                    "Download stage failed"
                );
                Err(e)
            }
            None => Ok(batch),
        }
    }

    /// Archive the given local files under the device's address.
    ///
    /// Every file is attempted. Returns the uploaded objects and the first
    /// error, if any file failed.
    async fn upload_paths(
        &self,
        device: &dyn CameraDevice,
        paths: &[PathBuf],
    ) -> (Vec<ArchivedObject>, Option<FleetError>) {
        let Some(archive) = &self.archive else {
            return (
                Vec::new(),
                Some(FleetError::config("no remote archive configured")),
            );
        };
        let address = device.endpoint().ip_address();
        let mut uploaded = Vec::with_capacity(paths.len());
        let mut first_error = None;

        for path in paths {
            match archive.upload_file(address, path).await {
                Ok(object) => uploaded.push(object),
                Err(e) => {
                    tracing::error!(device = %device.id(), path = %path.display(), error = %e, "Upload failed");
                    first_error.get_or_insert(FleetError::UploadError {
                        device: device.id().to_string(),
                        file: file_label(path),
                        message: e.to_string(),
                    });
                }
            }
        }

        (uploaded, first_error)
    }

    /// Remove the given files, then the directory if it ended up empty.
    async fn remove_local(&self, dir: &Path, paths: &[PathBuf]) -> usize {
        let mut removed = 0;
        for path in paths {
            match self.local.remove_file(path).await {
                Ok(()) => removed += 1,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to remove local file")
                }
            }
        }
        if let Err(e) = self.local.remove_dir(dir).await {
            tracing::debug!(dir = %dir.display(), error = %e, "Local directory left in place");
        }
        removed
    }

    /// Full pipeline for one camera.
    pub async fn transfer_device(&self, device: &dyn CameraDevice) -> TransferRecord {
        let mut record = TransferRecord::new(device.id().to_string(), self.device_dir(device));

        record.advance(TransferState::Downloading);
        match self.download_device(device).await {
            Ok(batch) => {
                record.downloaded = batch.files;
                record.size_mismatches = batch.size_mismatches;
                record.advance(TransferState::Downloaded);
            }
            Err(e) => {
                record.fail(TransferState::DownloadFailed, e);
                return record;
            }
        }

        record.advance(TransferState::Uploading);
        let paths: Vec<PathBuf> = record.downloaded.iter().map(|f| f.path.clone()).collect();
        let (uploaded, error) = self.upload_paths(device, &paths).await;
        record.uploaded = uploaded;
        if let Some(e) = error {
            tracing::warn!(
                device = %device.id(),
                uploaded = record.uploaded.len(),
                total = paths.len(),
                "Upload incomplete, keeping local files"
            );
            record.fail(TransferState::UploadFailed, e);
            return record;
        }
        record.advance(TransferState::Uploaded);

        if self.cleanup_after_upload {
            record.cleaned = self.remove_local(&record.local_dir, &paths).await;
            record.advance(TransferState::Cleaned);
        } else {
            record.advance(TransferState::Done);
        }

        tracing::info!(
            device = %device.id(),
            uploaded = record.uploaded.len(),
            cleaned = record.cleaned,
            "Transfer complete"
        );
        record
    }

    /// Transfer every camera concurrently. One batched alert covers all failures.
    pub async fn run(&self, fleet: &FleetCoordinator) -> TransferSummary {
        let records = join_all(
            fleet
                .devices()
                .iter()
                .map(|device| self.transfer_device(device.as_ref())),
        )
        .await;

        let outcomes = records.iter().map(TransferRecord::outcome).collect();
        let report = fleet.settle("transfer", outcomes).await;

        let summary = TransferSummary { records, report };
        tracing::info!(
            files_uploaded = summary.files_uploaded(),
            devices_succeeded = summary.devices_succeeded(),
            devices = summary.records.len(),
            "Transfer run finished"
        );
        summary
    }

    /// Download stage only, for every camera.
    pub async fn download_all(&self, fleet: &FleetCoordinator) -> FleetReport<DownloadBatch> {
        fleet
            .run("download", move |device| async move {
                self.download_device(device.as_ref()).await
            })
            .await
    }

    /// Archive whatever is already in one camera's local directory.
    pub async fn upload_local_device(
        &self,
        device: &dyn CameraDevice,
    ) -> FleetResult<Vec<ArchivedObject>> {
        let dir = self.device_dir(device);
        let paths = self.local.list_files(&dir).await.map_err(|e| FleetError::UploadError {
            device: device.id().to_string(),
            file: dir.display().to_string(),
            message: format!("cannot read local directory: {}", e),
        })?;

        let (uploaded, error) = self.upload_paths(device, &paths).await;
        match error {
            Some(e) => Err(e),
            None => Ok(uploaded),
        }
    }

    /// Standalone upload for every camera. Never deletes anything.
    pub async fn upload_local(&self, fleet: &FleetCoordinator) -> FleetReport<Vec<ArchivedObject>> {
        fleet
            .run("upload", move |device| async move {
                self.upload_local_device(device.as_ref()).await
            })
            .await
    }

    /// Remove every camera's local directory. Missing directories are fine.
    pub async fn cleanup_local(&self, fleet: &FleetCoordinator) -> FleetReport<()> {
        fleet
            .run("cleanup-local", move |device| async move {
                let dir = self.device_dir(device.as_ref());
                match self.local.remove_dir_all(&dir).await {
                    Ok(()) => {
                        tracing::info!(device = %device.id(), dir = %dir.display(), "Removed local directory");
                        Ok(())
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                    Err(e) => Err(FleetError::CommandFailed {
                        device: device.id().to_string(),
                        command: "cleanup-local".to_string(),
                        message: format!("cannot remove {}: {}", dir.display(), e),
                    }),
                }
            })
            .await
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
