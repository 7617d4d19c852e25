//! camfleet Storage Library
//!
//! Remote archive for media pulled off the cameras. The `Storage` trait is the
//! backend seam (S3 via `object_store`, or a local directory); `ArchiveUploader`
//! turns a downloaded file into one archived object.
//!
//! # Archive key format
//!
//! `{prefix}{device address}/{YYYY-MM-DD}/{file name}`, where the date is the
//! UTC upload date. Backends reject keys that are absolute or contain `..`
//! segments (`validate_key`). Key generation lives in the `keys` module so
//! every backend stays consistent.

pub mod archive;
pub mod content_type;
pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use archive::{ArchiveUploader, ArchivedObject};
pub use camfleet_core::StorageBackend;
pub use content_type::content_type_for;
pub use factory::create_storage;
pub use keys::{archive_key, validate_key};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
