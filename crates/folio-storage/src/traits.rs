//! Object store abstraction trait
//!
//! This module defines the `ObjectStore` trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use folio_core::{BucketInfo, BucketOptions, UploadOptions};
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Bucket already exists: {0}")]
    BucketAlreadyExists(String),

    #[error("Object already exists: {0}")]
    ObjectAlreadyExists(String),

    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("List failed: {0}")]
    ListFailed(String),

    #[error("Invalid storage path: {0}")]
    InvalidKey(String),

    #[error("Object exceeds bucket size limit: {0}")]
    PayloadTooLarge(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StorageError {
    /// True for both bucket and object "already exists" conflicts.
    pub fn is_already_exists(&self) -> bool {
        matches!(
            self,
            StorageError::BucketAlreadyExists(_) | StorageError::ObjectAlreadyExists(_)
        )
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Object store abstraction trait
///
/// All storage backends (Supabase, local filesystem, memory) implement this trait so
/// the upload pipeline can run against any of them. Buckets are flat namespaces of
/// objects addressed by a slash-separated path; see the crate root documentation.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List every bucket visible to the service credentials.
    async fn list_buckets(&self) -> StorageResult<Vec<BucketInfo>>;

    /// Create a bucket.
    ///
    /// Fails with `BucketAlreadyExists` when a bucket with that name is present; callers
    /// that only need the bucket to exist treat that as success.
    async fn create_bucket(&self, name: &str, options: BucketOptions) -> StorageResult<()>;

    /// Store `data` at `path` inside `bucket`.
    ///
    /// With `options.upsert == false` an existing object is never replaced and the call
    /// fails with `ObjectAlreadyExists`.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Vec<u8>,
        options: &UploadOptions,
    ) -> StorageResult<()>;

    /// Publicly resolvable URL of an object. Pure string construction, no I/O.
    fn public_url(&self, bucket: &str, path: &str) -> String;

    /// Remove objects. Paths that do not exist are ignored.
    async fn remove(&self, bucket: &str, paths: &[String]) -> StorageResult<()>;

    /// Substring that every public URL produced by this store contains, immediately
    /// followed by `/{bucket}/{path}`.
    fn public_url_marker(&self) -> &str;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_exists_covers_both_conflicts() {
        assert!(StorageError::BucketAlreadyExists("media".into()).is_already_exists());
        assert!(StorageError::ObjectAlreadyExists("a.png".into()).is_already_exists());
        assert!(!StorageError::UploadFailed("boom".into()).is_already_exists());
    }
}
