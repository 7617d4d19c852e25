use crate::keys::validate_key;
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use object_store::aws::AmazonS3Builder;
use object_store::buffered::BufWriter;
use object_store::path::Path as ObjectPath;
use object_store::{Attribute, Attributes, ObjectStore};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncWriteExt;

/// Multipart part size. Files below it go up in a single PUT.
pub const UPLOAD_PART_SIZE: usize = 8 * 1024 * 1024;

/// Archive in an S3 bucket (or any S3-compatible endpoint).
#[derive(Clone)]
pub struct S3Storage {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    /// Everything before the key in a returned object URL.
    url_base: String,
}

impl S3Storage {
    /// Credentials come from the standard AWS environment variables.
    /// With `endpoint`, requests go to that S3-compatible provider
    /// (e.g. "http://localhost:9000" for MinIO) and URLs are path-style.
    pub async fn new(bucket: String, region: String, endpoint: Option<String>) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.as_str())
            .with_bucket_name(bucket.as_str());

        let url_base = match endpoint {
            Some(endpoint) => {
                let endpoint = endpoint.trim_end_matches('/').to_string();
                builder = builder
                    .with_allow_http(endpoint.starts_with("http://"))
                    .with_endpoint(endpoint.as_str());
                format!("{}/{}", endpoint, bucket)
            }
            None => format!("https://{}.s3.{}.amazonaws.com", bucket, region),
        };

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            store: Arc::new(store),
            bucket,
            url_base,
        })
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.url_base, key)
    }
}

/// Copy `source` into `location` through a buffered multipart writer, so at
/// most one part is in memory. A failed upload is aborted before returning.
pub async fn stream_file(
    store: Arc<dyn ObjectStore>,
    location: ObjectPath,
    source: &Path,
    content_type: &str,
    part_size: usize,
) -> StorageResult<u64> {
    let mut file = tokio::fs::File::open(source).await.map_err(|e| {
        StorageError::UploadFailed(format!("Failed to open {}: {}", source.display(), e))
    })?;

    let mut attributes = Attributes::new();
    attributes.insert(Attribute::ContentType, content_type.to_string().into());
    let mut writer = BufWriter::with_capacity(store, location, part_size).with_attributes(attributes);

    let copied = match tokio::io::copy(&mut file, &mut writer).await {
        Ok(n) => writer.shutdown().await.map(|_| n),
        Err(e) => Err(e),
    };

    match copied {
        Ok(n) => Ok(n),
        Err(e) => {
            if let Err(abort_err) = writer.abort().await {
                tracing::warn!(error = %abort_err, "Failed to abort multipart upload");
            }
            Err(StorageError::UploadFailed(e.to_string()))
        }
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn put_file(&self, key: &str, source: &Path, content_type: &str) -> StorageResult<String> {
        validate_key(key)?;
        let start = Instant::now();

        let size_bytes = match stream_file(
            self.store.clone(),
            ObjectPath::from(key),
            source,
            content_type,
            UPLOAD_PART_SIZE,
        )
        .await
        {
            Ok(n) => n,
            Err(e) => {
                tracing::error!(
                    bucket = %self.bucket,
                    key = %key,
                    error = %e,
                    "Archive upload to S3 failed"
                );
                return Err(e);
            }
        };

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            content_type = %content_type,
            size_bytes,
            duration_ms = start.elapsed().as_millis() as u64,
            "Archived to S3"
        );
        Ok(self.object_url(key))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
