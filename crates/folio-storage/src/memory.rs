//! In-process object store for development and tests.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use folio_core::{BucketInfo, BucketOptions, UploadOptions};
use tokio::sync::RwLock;

use crate::keys::{validate_bucket_name, validate_object_path};
use crate::traits::{ObjectStore, StorageError, StorageResult};
use crate::StorageBackend;

const MEMORY_BASE_URL: &str = "memory://";
const MEMORY_MARKER: &str = "storage/v1/object/public";

/// An object held by [`MemoryStorage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
    pub cache_control: String,
}

#[derive(Debug, Default)]
struct MemoryBucket {
    options: Option<BucketOptions>,
    objects: HashMap<String, StoredObject>,
}

/// Object store that keeps everything in a map guarded by an async lock.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    buckets: RwLock<BTreeMap<String, MemoryBucket>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a stored object.
    pub async fn object(&self, bucket: &str, path: &str) -> Option<StoredObject> {
        let buckets = self.buckets.read().await;
        buckets.get(bucket)?.objects.get(path).cloned()
    }

    /// Number of objects in a bucket (0 when the bucket does not exist).
    pub async fn object_count(&self, bucket: &str) -> usize {
        let buckets = self.buckets.read().await;
        buckets.get(bucket).map(|b| b.objects.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ObjectStore for MemoryStorage {
    async fn list_buckets(&self) -> StorageResult<Vec<BucketInfo>> {
        let buckets = self.buckets.read().await;
        Ok(buckets
            .iter()
            .map(|(name, bucket)| BucketInfo {
                name: name.clone(),
                public: bucket.options.map(|o| o.public).unwrap_or(false),
                file_size_limit: bucket.options.and_then(|o| o.file_size_limit),
            })
            .collect())
    }

    async fn create_bucket(&self, name: &str, options: BucketOptions) -> StorageResult<()> {
        validate_bucket_name(name)?;

        let mut buckets = self.buckets.write().await;
        if buckets.contains_key(name) {
            return Err(StorageError::BucketAlreadyExists(name.to_string()));
        }
        buckets.insert(
            name.to_string(),
            MemoryBucket {
                options: Some(options),
                objects: HashMap::new(),
            },
        );

        tracing::debug!(bucket = %name, public = options.public, "Memory bucket created");
        Ok(())
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Vec<u8>,
        options: &UploadOptions,
    ) -> StorageResult<()> {
        validate_object_path(path)?;
        let size = data.len() as u64;

        let mut buckets = self.buckets.write().await;
        let entry = buckets
            .get_mut(bucket)
            .ok_or_else(|| StorageError::BucketNotFound(bucket.to_string()))?;

        if let Some(limit) = entry.options.and_then(|o| o.file_size_limit) {
            if size > limit {
                return Err(StorageError::PayloadTooLarge(format!(
                    "{} bytes exceeds limit of {} bytes",
                    size, limit
                )));
            }
        }

        if !options.upsert && entry.objects.contains_key(path) {
            return Err(StorageError::ObjectAlreadyExists(path.to_string()));
        }

        entry.objects.insert(
            path.to_string(),
            StoredObject {
                data,
                content_type: options.content_type.clone(),
                cache_control: options.cache_control.clone(),
            },
        );

        tracing::debug!(bucket = %bucket, key = %path, size_bytes = size, "Memory upload stored");
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}{}/{}/{}", MEMORY_BASE_URL, MEMORY_MARKER, bucket, path)
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> StorageResult<()> {
        let mut buckets = self.buckets.write().await;
        let entry = buckets
            .get_mut(bucket)
            .ok_or_else(|| StorageError::BucketNotFound(bucket.to_string()))?;

        for path in paths {
            entry.objects.remove(path);
        }
        Ok(())
    }

    fn public_url_marker(&self) -> &str {
        MEMORY_MARKER
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}
