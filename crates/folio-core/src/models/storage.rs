use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_CACHE_CONTROL;

/// A bucket as reported by the object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketInfo {
    pub name: String,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub file_size_limit: Option<u64>,
}

/// Options applied when creating a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketOptions {
    pub public: bool,
    pub file_size_limit: Option<u64>,
}

/// Options applied to a single object transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// Max-age in seconds, sent as `Cache-Control`.
    pub cache_control: String,
    /// Overwrite an existing object at the same path. The pipeline always sends `false`.
    pub upsert: bool,
    pub content_type: String,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            cache_control: DEFAULT_CACHE_CONTROL.to_string(),
            upsert: false,
            content_type: "application/octet-stream".to_string(),
        }
    }
}
