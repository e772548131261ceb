use crate::keys::{validate_bucket_name, validate_object_path};
use crate::traits::{ObjectStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use folio_core::{BucketInfo, BucketOptions, UploadOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// File holding a bucket's options inside its directory.
const BUCKET_META_FILE: &str = ".bucket.json";

/// Local filesystem storage implementation
///
/// Each bucket is a directory under `base_path`; objects are files below it.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for buckets (e.g., "/var/lib/folio/storage")
    /// * `base_url` - Base URL the directory is served from (e.g., "http://localhost:4000/files")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn bucket_dir(&self, bucket: &str) -> StorageResult<PathBuf> {
        validate_bucket_name(bucket)?;
        Ok(self.base_path.join(bucket))
    }

    /// Convert bucket and object path to a filesystem path with security validation
    ///
    /// Rejects traversal sequences, then checks that whatever already exists on disk
    /// still resolves inside the bucket directory.
    async fn key_to_path(&self, bucket: &str, path: &str) -> StorageResult<PathBuf> {
        validate_object_path(path)?;
        if path == BUCKET_META_FILE {
            return Err(StorageError::InvalidKey(
                "Storage path is reserved".to_string(),
            ));
        }

        let bucket_dir = self.bucket_dir(bucket)?;
        let full = bucket_dir.join(path);

        let bucket_canonical = match fs::canonicalize(&bucket_dir).await {
            Ok(p) => p,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::BucketNotFound(bucket.to_string()))
            }
            Err(e) => {
                return Err(StorageError::ConfigError(format!(
                    "Failed to canonicalize bucket path: {}",
                    e
                )))
            }
        };

        // Walk up to the deepest existing ancestor; symlinks there must not leave the bucket.
        let mut existing = full.as_path();
        while !fs::try_exists(existing).await.unwrap_or(false) {
            match existing.parent() {
                Some(parent) => existing = parent,
                None => break,
            }
        }
        if let Ok(canonical) = fs::canonicalize(existing).await {
            if canonical.strip_prefix(&bucket_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage path resolves outside bucket directory".to_string(),
                ));
            }
        }

        Ok(full)
    }

    /// Generate public URL for file
    fn generate_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, bucket, path)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn read_options(&self, bucket_dir: &Path) -> Option<BucketOptions> {
        let raw = fs::read(bucket_dir.join(BUCKET_META_FILE)).await.ok()?;
        serde_json::from_slice(&raw).ok()
    }

    /// Write `data` next to `target` and move it into place once it is synced.
    ///
    /// Without `upsert` the final step is a hard link, which fails if `target` exists.
    async fn write_staged(
        &self,
        staging: &Path,
        target: &Path,
        data: &[u8],
        upsert: bool,
    ) -> StorageResult<()> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(staging)
            .await
            .map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to create file {}: {}",
                    staging.display(),
                    e
                ))
            })?;

        file.write_all(data).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to write file {}: {}",
                staging.display(),
                e
            ))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to sync file {}: {}",
                staging.display(),
                e
            ))
        })?;
        drop(file);

        if upsert {
            fs::rename(staging, target).await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to move file into {}: {}",
                    target.display(),
                    e
                ))
            })?;
            return Ok(());
        }

        match fs::hard_link(staging, target).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StorageError::ObjectAlreadyExists(
                    target.display().to_string(),
                ));
            }
            Err(e) => {
                return Err(StorageError::UploadFailed(format!(
                    "Failed to link file into {}: {}",
                    target.display(),
                    e
                )));
            }
        }
        if let Err(e) = fs::remove_file(staging).await {
            tracing::warn!(path = %staging.display(), error = %e, "Failed to remove staging file");
        }
        Ok(())
    }
}

/// Hidden sibling of `target` that an upload is written to before it becomes visible.
fn staging_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{}.{:016x}.part", name, rand::random::<u64>()))
}

#[async_trait]
impl ObjectStore for LocalStorage {
    async fn list_buckets(&self) -> StorageResult<Vec<BucketInfo>> {
        let mut entries = fs::read_dir(&self.base_path).await.map_err(|e| {
            StorageError::ListFailed(format!(
                "Failed to read {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let mut buckets = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::ListFailed(e.to_string()))?
        {
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            let name = entry.file_name().to_string_lossy().into_owned();
            if !is_dir || name.starts_with('.') {
                continue;
            }

            let options = self.read_options(&entry.path()).await;
            buckets.push(BucketInfo {
                name,
                public: options.map(|o| o.public).unwrap_or(false),
                file_size_limit: options.and_then(|o| o.file_size_limit),
            });
        }

        buckets.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(buckets)
    }

    async fn create_bucket(&self, name: &str, options: BucketOptions) -> StorageResult<()> {
        let dir = self.bucket_dir(name)?;

        match fs::create_dir(&dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StorageError::BucketAlreadyExists(name.to_string()));
            }
            Err(e) => {
                return Err(StorageError::BackendError(format!(
                    "Failed to create bucket directory {}: {}",
                    dir.display(),
                    e
                )));
            }
        }

        let meta = serde_json::to_vec(&options)
            .map_err(|e| StorageError::BackendError(e.to_string()))?;
        fs::write(dir.join(BUCKET_META_FILE), meta).await?;

        tracing::info!(
            bucket = %name,
            path = %dir.display(),
            public = options.public,
            "Local bucket created"
        );

        Ok(())
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Vec<u8>,
        options: &UploadOptions,
    ) -> StorageResult<()> {
        let file_path = self.key_to_path(bucket, path).await?;
        let size = data.len();

        let bucket_dir = self.bucket_dir(bucket)?;
        if let Some(limit) = self
            .read_options(&bucket_dir)
            .await
            .and_then(|o| o.file_size_limit)
        {
            if size as u64 > limit {
                return Err(StorageError::PayloadTooLarge(format!(
                    "{} bytes exceeds limit of {} bytes",
                    size, limit
                )));
            }
        }

        self.ensure_parent_dir(&file_path).await?;

        let start = std::time::Instant::now();

        let staging = staging_path(&file_path);
        if let Err(e) = self
            .write_staged(&staging, &file_path, &data, options.upsert)
            .await
        {
            if let Err(cleanup) = fs::remove_file(&staging).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    tracing::warn!(path = %staging.display(), error = %cleanup, "Failed to remove staging file");
                }
            }
            return Err(match e {
                StorageError::ObjectAlreadyExists(_) => {
                    StorageError::ObjectAlreadyExists(path.to_string())
                }
                other => other,
            });
        }

        tracing::info!(
            path = %file_path.display(),
            bucket = %bucket,
            key = %path,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.generate_url(bucket, path)
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> StorageResult<()> {
        let start = std::time::Instant::now();

        for path in paths {
            let file_path = self.key_to_path(bucket, path).await?;

            match fs::remove_file(&file_path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(StorageError::DeleteFailed(format!(
                        "Failed to delete file {}: {}",
                        file_path.display(),
                        e
                    )));
                }
            }
        }

        tracing::info!(
            bucket = %bucket,
            count = paths.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    fn public_url_marker(&self) -> &str {
        &self.base_url
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const BASE_URL: &str = "http://localhost:4000/files";

    fn media_options() -> BucketOptions {
        BucketOptions {
            public: true,
            file_size_limit: Some(16),
        }
    }

    async fn storage_with_bucket(dir: &Path) -> LocalStorage {
        let storage = LocalStorage::new(dir, BASE_URL.to_string()).await.unwrap();
        storage
            .create_bucket("media", media_options())
            .await
            .unwrap();
        storage
    }

    #[tokio::test]
    async fn test_bucket_create_and_list() {
        let dir = tempdir().unwrap();
        let storage = storage_with_bucket(dir.path()).await;

        let buckets = storage.list_buckets().await.unwrap();
        assert_eq!(
            buckets,
            vec![BucketInfo {
                name: "media".to_string(),
                public: true,
                file_size_limit: Some(16),
            }]
        );

        let err = storage
            .create_bucket("media", media_options())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::BucketAlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_upload_writes_file_and_url() {
        let dir = tempdir().unwrap();
        let storage = storage_with_bucket(dir.path()).await;

        storage
            .upload(
                "media",
                "images/a.png",
                b"png".to_vec(),
                &UploadOptions::default(),
            )
            .await
            .unwrap();

        let on_disk = std::fs::read(dir.path().join("media/images/a.png")).unwrap();
        assert_eq!(on_disk, b"png");
        assert_eq!(
            storage.public_url("media", "images/a.png"),
            "http://localhost:4000/files/media/images/a.png"
        );
    }

    #[tokio::test]
    async fn test_upload_does_not_overwrite() {
        let dir = tempdir().unwrap();
        let storage = storage_with_bucket(dir.path()).await;
        let opts = UploadOptions::default();

        storage
            .upload("media", "a.png", b"first".to_vec(), &opts)
            .await
            .unwrap();
        let err = storage
            .upload("media", "a.png", b"second".to_vec(), &opts)
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::ObjectAlreadyExists(_)));
        assert_eq!(std::fs::read(dir.path().join("media/a.png")).unwrap(), b"first");
    }

    #[tokio::test]
    async fn test_upload_respects_size_limit() {
        let dir = tempdir().unwrap();
        let storage = storage_with_bucket(dir.path()).await;

        let err = storage
            .upload("media", "big.bin", vec![0u8; 17], &UploadOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::PayloadTooLarge(_)));
    }

    #[tokio::test]
    async fn test_upload_into_missing_bucket() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), BASE_URL.to_string())
            .await
            .unwrap();

        let err = storage
            .upload("media", "a.png", b"x".to_vec(), &UploadOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::BucketNotFound(_)));
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage_with_bucket(dir.path()).await;
        let opts = UploadOptions::default();

        let result = storage
            .upload("media", "../../../etc/passwd", b"x".to_vec(), &opts)
            .await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.remove("media", &["../etc/passwd".to_string()]).await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage
            .upload("media", ".bucket.json", b"{}".to_vec(), &opts)
            .await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_remove_nonexistent_is_ok() {
        let dir = tempdir().unwrap();
        let storage = storage_with_bucket(dir.path()).await;

        storage
            .upload("media", "keep/a.png", b"x".to_vec(), &UploadOptions::default())
            .await
            .unwrap();
        storage
            .remove(
                "media",
                &["keep/a.png".to_string(), "nonexistent/file.txt".to_string()],
            )
            .await
            .unwrap();

        assert!(!dir.path().join("media/keep/a.png").exists());
    }

    #[tokio::test]
    async fn test_marker_is_base_url() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), format!("{}/", BASE_URL))
            .await
            .unwrap();
        assert_eq!(storage.public_url_marker(), BASE_URL);
    }

    fn staging_files(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".part"))
            .collect()
    }

    #[tokio::test]
    async fn test_collision_leaves_no_staging_file() {
        let dir = tempdir().unwrap();
        let storage = storage_with_bucket(dir.path()).await;
        let opts = UploadOptions::default();

        storage
            .upload("media", "images/a.png", b"first".to_vec(), &opts)
            .await
            .unwrap();
        let err = storage
            .upload("media", "images/a.png", b"second".to_vec(), &opts)
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::ObjectAlreadyExists(ref p) if p == "images/a.png"));
        assert!(staging_files(&dir.path().join("media/images")).is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_removes_partial_file() {
        let dir = tempdir().unwrap();
        let storage = storage_with_bucket(dir.path()).await;
        // A directory where the object should go makes the final move fail.
        std::fs::create_dir_all(dir.path().join("media/images/a.png/inner")).unwrap();
        let opts = UploadOptions {
            upsert: true,
            ..UploadOptions::default()
        };

        let err = storage
            .upload("media", "images/a.png", b"data".to_vec(), &opts)
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::UploadFailed(_)));
        assert!(staging_files(&dir.path().join("media/images")).is_empty());
        assert!(dir.path().join("media/images/a.png").is_dir());
    }
}
