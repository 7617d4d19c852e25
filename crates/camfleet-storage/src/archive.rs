//! Upload of downloaded camera files into the remote archive.

use std::path::Path;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use crate::content_type::content_type_for;
use crate::keys::archive_key;
use crate::traits::{Storage, StorageError, StorageResult};

/// One file stored in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedObject {
    pub key: String,
    pub url: String,
    pub size_bytes: u64,
    pub content_type: &'static str,
}

/// Places local files under `{prefix}{device address}/{date}/{name}`.
#[derive(Clone)]
pub struct ArchiveUploader {
    storage: Arc<dyn Storage>,
    prefix: String,
}

impl ArchiveUploader {
    pub fn new(storage: Arc<dyn Storage>, prefix: impl Into<String>) -> Self {
        Self {
            storage,
            prefix: prefix.into(),
        }
    }

    /// Upload with today's UTC date in the key.
    pub async fn upload_file(&self, device_address: &str, path: &Path) -> StorageResult<ArchivedObject> {
        self.upload_file_dated(device_address, path, Utc::now().date_naive())
            .await
    }

    pub async fn upload_file_dated(
        &self,
        device_address: &str,
        path: &Path,
        date: NaiveDate,
    ) -> StorageResult<ArchivedObject> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StorageError::InvalidKey(format!("no file name in {}", path.display())))?;

        let size_bytes = tokio::fs::metadata(path)
            .await
            .map_err(|e| {
                StorageError::UploadFailed(format!("Failed to read {}: {}", path.display(), e))
            })?
            .len();

        let key = archive_key(&self.prefix, device_address, date, filename);
        let content_type = content_type_for(filename);
        let url = self
            .storage
            .put_file(&key, path, content_type)
            .await?;

        tracing::debug!(
            device = %device_address,
            key = %key,
            size_bytes = size_bytes,
            backend = %self.storage.backend_type(),
            "Archived file"
        );

        Ok(ArchivedObject {
            key,
            url,
            size_bytes,
            content_type,
        })
    }
}
