use crate::keys::validate_key;
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Archive kept in a local (or network-mounted) directory.
#[derive(Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Open the archive at `root`, creating the directory if needed.
    pub async fn new(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|e| {
            StorageError::ConfigError(format!("cannot create {}: {}", root.display(), e))
        })?;
        Ok(LocalStorage { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put_file(&self, key: &str, source: &Path, content_type: &str) -> StorageResult<String> {
        validate_key(key)?;
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let size_bytes = fs::copy(source, &path).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "cannot copy {} to {}: {}",
                source.display(),
                path.display(),
                e
            ))
        })?;

        tracing::info!(
            key = %key,
            content_type = %content_type,
            size_bytes,
            "Archived to local directory"
        );
        Ok(format!("file://{}", path.display()))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
