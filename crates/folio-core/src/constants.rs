//! Storage and rendering constants shared across crates.

/// Bucket every upload lands in unless a caller names another one.
pub const DEFAULT_BUCKET: &str = "media";

/// Folder used by `upload_file` when the caller does not pick one.
pub const DEFAULT_FOLDER: &str = "uploads";

/// Per-object size cap applied when the bucket is created (10 MB).
pub const BUCKET_FILE_SIZE_LIMIT_BYTES: u64 = 10 * 1024 * 1024;

/// Largest file the upload gate lets through by default (5 MB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Accept pattern used when a caller does not supply one.
pub const DEFAULT_UPLOAD_ACCEPT: &str = "image/*";

/// Accept patterns an upload request may choose from, besides the default.
pub const DEFAULT_UPLOAD_ALLOWED_ACCEPTS: &str = "image/*,video/*,.pdf";

/// `Cache-Control` max-age, in seconds, sent with every transfer.
pub const DEFAULT_CACHE_CONTROL: &str = "3600";

/// Image rendered in place of any reference that is not render-safe.
pub const PLACEHOLDER_IMAGE_PATH: &str = "/placeholder.svg";

/// Path segment that identifies a public object URL on the hosted store.
pub const PUBLIC_OBJECT_MARKER: &str = "storage/v1/object/public";

/// Extension used when an uploaded filename carries none.
pub const FALLBACK_EXTENSION: &str = "bin";

/// Length of the random token in generated storage paths.
pub const STORAGE_TOKEN_LEN: usize = 13;
