//! Media upload pipeline: bucket bootstrap, path derivation, transfer, public URL,
//! and delete-by-URL.
//!
//! The service keeps no state between calls. Bootstrap re-checks the bucket every
//! time and relies on the store's create-if-absent conflict for concurrent callers.

use std::sync::Arc;
use std::time::Instant;

use folio_core::constants::{DEFAULT_BUCKET, DEFAULT_CACHE_CONTROL, DEFAULT_FOLDER};
use folio_core::{BucketOptions, Config, UploadOptions, UploadTarget};
use folio_storage::{extract_storage_path, generate_storage_path, ObjectStore, StorageError};
use serde::Serialize;

/// Outcome of a successful bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketBootstrap {
    /// The bucket was already present (listed, or created concurrently by someone else).
    pub existed: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Failed to list storage buckets: {0}")]
    ListFailed(#[source] StorageError),

    #[error("Failed to create storage bucket: {0}")]
    CreateFailed(#[source] StorageError),
}

/// A stored object and where to fetch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedObject {
    pub path: String,
    pub public_url: String,
    pub size_bytes: u64,
}

#[derive(Clone)]
pub struct MediaStorageService {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    bucket_options: BucketOptions,
    cache_control: String,
}

impl MediaStorageService {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>, file_size_limit: u64) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            bucket_options: BucketOptions {
                public: true,
                file_size_limit: Some(file_size_limit),
            },
            cache_control: DEFAULT_CACHE_CONTROL.to_string(),
        }
    }

    pub fn from_config(store: Arc<dyn ObjectStore>, config: &Config) -> Self {
        Self::new(
            store,
            config.media_bucket(),
            config.bucket_file_size_limit_bytes(),
        )
        .with_cache_control(config.upload_cache_control())
    }

    pub fn with_cache_control(mut self, cache_control: impl Into<String>) -> Self {
        self.cache_control = cache_control.into();
        self
    }

    /// Default bucket for uploads and deletes.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Make sure the default bucket exists. Never fails; errors are logged.
    pub async fn ensure_storage_bucket(&self) -> bool {
        match self.bootstrap_bucket().await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(bucket = %self.bucket, error = %e, "Storage bucket bootstrap failed");
                false
            }
        }
    }

    /// Create the default bucket if it is missing.
    pub async fn bootstrap_bucket(&self) -> Result<BucketBootstrap, BootstrapError> {
        self.bootstrap_named(&self.bucket).await
    }

    async fn bootstrap_named(&self, bucket: &str) -> Result<BucketBootstrap, BootstrapError> {
        let buckets = self
            .store
            .list_buckets()
            .await
            .map_err(BootstrapError::ListFailed)?;

        if buckets.iter().any(|b| b.name == bucket) {
            return Ok(BucketBootstrap { existed: true });
        }

        match self.store.create_bucket(bucket, self.bucket_options).await {
            Ok(()) => {
                tracing::info!(
                    bucket = %bucket,
                    file_size_limit = ?self.bucket_options.file_size_limit,
                    "Storage bucket created"
                );
                Ok(BucketBootstrap { existed: false })
            }
            // Lost a create race with another caller; the bucket exists either way.
            Err(e) if e.is_already_exists() => Ok(BucketBootstrap { existed: true }),
            Err(e) => Err(BootstrapError::CreateFailed(e)),
        }
    }

    /// Upload a file and return its public URL, or `None` on failure.
    pub async fn upload_file(
        &self,
        target: UploadTarget,
        bucket: Option<&str>,
        folder: Option<&str>,
    ) -> Option<String> {
        let filename = target.original_filename.clone();
        match self.try_upload(target, bucket, folder).await {
            Ok(uploaded) => Some(uploaded.public_url),
            Err(e) => {
                tracing::error!(
                    bucket = %bucket.unwrap_or(&self.bucket),
                    filename = %filename,
                    error = %e,
                    "File upload failed"
                );
                None
            }
        }
    }

    /// Upload a file under a freshly generated path.
    ///
    /// Bootstrap runs first but its failure does not stop the transfer: if the bucket
    /// really is missing the transfer fails on its own. Existing objects are never
    /// overwritten.
    pub async fn try_upload(
        &self,
        target: UploadTarget,
        bucket: Option<&str>,
        folder: Option<&str>,
    ) -> Result<UploadedObject, StorageError> {
        let bucket = bucket.unwrap_or(&self.bucket);
        let folder = folder.unwrap_or(DEFAULT_FOLDER);

        if let Err(e) = self.bootstrap_named(bucket).await {
            tracing::warn!(bucket = %bucket, error = %e, "Bucket bootstrap failed, attempting upload anyway");
        }

        let path = generate_storage_path(folder, &target.original_filename);
        let size_bytes = target.size();
        let options = UploadOptions {
            cache_control: self.cache_control.clone(),
            upsert: false,
            content_type: target.content_type.clone(),
        };

        let start = Instant::now();
        self.store
            .upload(bucket, &path, target.data, &options)
            .await?;
        let public_url = self.store.public_url(bucket, &path);

        tracing::info!(
            bucket = %bucket,
            key = %path,
            category = ?target.category,
            size_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "File uploaded"
        );

        Ok(UploadedObject {
            path,
            public_url,
            size_bytes,
        })
    }

    /// Delete by public URL or bare path. `false` only when the store reports an error.
    pub async fn delete_file(&self, url_or_path: &str, bucket: Option<&str>) -> bool {
        match self.try_delete(url_or_path, bucket).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    bucket = %bucket.unwrap_or(&self.bucket),
                    target = %url_or_path,
                    error = %e,
                    "File delete failed"
                );
                false
            }
        }
    }

    pub async fn try_delete(&self, url_or_path: &str, bucket: Option<&str>) -> Result<(), StorageError> {
        if url_or_path.is_empty() {
            return Ok(());
        }

        let bucket = bucket.unwrap_or(&self.bucket);
        let path = extract_storage_path(url_or_path, bucket, self.store.public_url_marker());
        if path.is_empty() {
            return Ok(());
        }

        self.store.remove(bucket, std::slice::from_ref(&path)).await?;
        tracing::info!(bucket = %bucket, key = %path, "File deleted");
        Ok(())
    }
}

impl Default for MediaStorageService {
    /// In-memory service with the stock bucket settings.
    fn default() -> Self {
        Self::new(
            Arc::new(folio_storage::MemoryStorage::new()),
            DEFAULT_BUCKET,
            folio_core::constants::BUCKET_FILE_SIZE_LIMIT_BYTES,
        )
    }
}
