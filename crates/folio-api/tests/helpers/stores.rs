//! Object stores that fail on purpose.

use async_trait::async_trait;
use folio_core::{BucketInfo, BucketOptions, UploadOptions};
use folio_services::{ObjectStore, StorageBackend, StorageError, StorageResult};
use std::sync::atomic::{AtomicUsize, Ordering};

const MARKER: &str = "storage/v1/object/public";

/// Store that cannot be reached; counts upload attempts.
#[derive(Default)]
pub struct UnreachableStore {
    uploads: AtomicUsize,
}

impl UnreachableStore {
    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for UnreachableStore {
    async fn list_buckets(&self) -> StorageResult<Vec<BucketInfo>> {
        Err(StorageError::ListFailed("connection refused".to_string()))
    }

    async fn create_bucket(&self, _name: &str, _options: BucketOptions) -> StorageResult<()> {
        Err(StorageError::BackendError("connection refused".to_string()))
    }

    async fn upload(
        &self,
        _bucket: &str,
        path: &str,
        _data: Vec<u8>,
        _options: &UploadOptions,
    ) -> StorageResult<()> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::UploadFailed(path.to_string()))
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("https://unreachable.test/{}/{}/{}", MARKER, bucket, path)
    }

    async fn remove(&self, _bucket: &str, _paths: &[String]) -> StorageResult<()> {
        Err(StorageError::DeleteFailed("connection refused".to_string()))
    }

    fn public_url_marker(&self) -> &str {
        MARKER
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Supabase
    }
}

/// Store that lists buckets but refuses to create one.
pub struct ReadOnlyStore;

#[async_trait]
impl ObjectStore for ReadOnlyStore {
    async fn list_buckets(&self) -> StorageResult<Vec<BucketInfo>> {
        Ok(Vec::new())
    }

    async fn create_bucket(&self, name: &str, _options: BucketOptions) -> StorageResult<()> {
        Err(StorageError::BackendError(format!(
            "not allowed to create {}",
            name
        )))
    }

    async fn upload(
        &self,
        bucket: &str,
        _path: &str,
        _data: Vec<u8>,
        _options: &UploadOptions,
    ) -> StorageResult<()> {
        Err(StorageError::BucketNotFound(bucket.to_string()))
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("https://readonly.test/{}/{}/{}", MARKER, bucket, path)
    }

    async fn remove(&self, _bucket: &str, _paths: &[String]) -> StorageResult<()> {
        Ok(())
    }

    fn public_url_marker(&self) -> &str {
        MARKER
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Supabase
    }
}

/// Store whose bucket exists but every generated path is already taken.
pub struct CollidingStore;

#[async_trait]
impl ObjectStore for CollidingStore {
    async fn list_buckets(&self) -> StorageResult<Vec<BucketInfo>> {
        Ok(vec![BucketInfo {
            name: "media".to_string(),
            public: true,
            file_size_limit: Some(10 * 1024 * 1024),
        }])
    }

    async fn create_bucket(&self, name: &str, _options: BucketOptions) -> StorageResult<()> {
        Err(StorageError::BucketAlreadyExists(name.to_string()))
    }

    async fn upload(
        &self,
        _bucket: &str,
        path: &str,
        _data: Vec<u8>,
        _options: &UploadOptions,
    ) -> StorageResult<()> {
        Err(StorageError::ObjectAlreadyExists(path.to_string()))
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("https://colliding.test/{}/{}/{}", MARKER, bucket, path)
    }

    async fn remove(&self, _bucket: &str, _paths: &[String]) -> StorageResult<()> {
        Ok(())
    }

    fn public_url_marker(&self) -> &str {
        MARKER
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Supabase
    }
}
