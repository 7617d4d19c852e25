//! The archive backend seam.

use crate::StorageBackend;
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Invalid archive key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Archive configuration error: {0}")]
    ConfigError(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Write-only archive backend.
///
/// Keys are produced by [`crate::keys::archive_key`]; backends validate them
/// with [`crate::keys::validate_key`] and never rewrite them. Writing an
/// existing key replaces the object.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Stream the file at `source` into `key` and return the object's URL.
    /// The file is never held in memory as a whole.
    async fn put_file(&self, key: &str, source: &Path, content_type: &str) -> StorageResult<String>;

    fn backend_type(&self) -> StorageBackend;
}
