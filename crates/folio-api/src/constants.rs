//! API constants
//!
//! Routes are not versioned; every JSON endpoint lives under [`API_PREFIX`].

/// API base path prefix
pub const API_PREFIX: &str = "/api";

/// Slack added on top of the bucket limit for multipart framing.
pub const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// Timeout for the storage check behind `/ready`.
pub const READINESS_TIMEOUT_SECS: u64 = 5;

/// Message shown next to a profile image field when the probe says no.
pub const INVALID_IMAGE_URL_MESSAGE: &str =
    "The provided URL is not a valid image. Please enter a direct link to an image file.";

/// Returned by the upload route when the bucket cannot be prepared.
pub const STORAGE_NOT_READY_MESSAGE: &str =
    "Storage not available. Please initialize storage first.";

/// Returned when a request body is rejected by the global size limit.
pub const BODY_TOO_LARGE_MESSAGE: &str = "Request body exceeds the upload limit";
