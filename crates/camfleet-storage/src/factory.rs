#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use camfleet_core::ArchiveConfig;
use std::sync::Arc;

fn required(value: &Option<String>, variable: &str) -> StorageResult<String> {
    value
        .clone()
        .ok_or_else(|| StorageError::ConfigError(format!("{} is not set", variable)))
}

/// Build the archive backend selected by `STORAGE_BACKEND`.
pub async fn create_storage(config: &ArchiveConfig) -> StorageResult<Arc<dyn Storage>> {
    let backend = config.backend();
    tracing::debug!(backend = %backend, "Creating archive backend");

    match backend {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = required(&config.s3_bucket, "AWS_S3_BUCKET")?;
            let region = required(&config.s3_region, "AWS_REGION")?;
            let storage = S3Storage::new(bucket, region, config.s3_endpoint.clone()).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let root = required(&config.local_path, "LOCAL_ARCHIVE_PATH")?;
            Ok(Arc::new(LocalStorage::new(root).await?))
        }

        #[allow(unreachable_patterns)]
        other => Err(StorageError::ConfigError(format!(
            "archive backend '{}' is not compiled in",
            other
        ))),
    }
}
