//! Shared path generation and validation for storage backends.
//!
//! Path format: `{folder}/{token}_{timestamp_ms}.{extension}` where `token` is
//! [`STORAGE_TOKEN_LEN`] random lowercase base-36 characters.

use folio_core::constants::{FALLBACK_EXTENSION, STORAGE_TOKEN_LEN};
use rand::Rng;

use crate::{StorageError, StorageResult};

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Random lowercase base-36 token.
pub fn random_token(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect()
}

/// Extension taken from the text after the last `.` of a filename, lowercased.
///
/// Falls back to `bin` when the name has no `.` or nothing usable follows it.
pub fn file_extension(filename: &str) -> String {
    let ext: String = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();

    if ext.is_empty() {
        FALLBACK_EXTENSION.to_string()
    } else {
        ext
    }
}

/// Generate a storage path for a new object.
///
/// Two calls in the same millisecond still differ in the random token, so paths are
/// unique with overwhelming probability. The store's no-overwrite rule covers the rest.
pub fn generate_storage_path(folder: &str, original_filename: &str) -> String {
    let name = format!(
        "{}_{}.{}",
        random_token(STORAGE_TOKEN_LEN),
        chrono::Utc::now().timestamp_millis(),
        file_extension(original_filename)
    );

    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        name
    } else {
        format!("{}/{}", folder, name)
    }
}

/// Map a public URL (or a bare path) back to the object path inside `bucket`.
///
/// When `input` contains `marker`, the path is everything after the first
/// `{bucket}/` that follows the marker, with query string and fragment dropped and
/// percent-encoding decoded. Any other input is already a path and comes back as-is.
pub fn extract_storage_path(input: &str, bucket: &str, marker: &str) -> String {
    if marker.is_empty() {
        return input.to_string();
    }
    let Some(marker_at) = input.find(marker) else {
        return input.to_string();
    };

    let after_marker = &input[marker_at + marker.len()..];
    let needle = format!("{}/", bucket);
    let Some(bucket_at) = after_marker.find(&needle) else {
        return input.to_string();
    };

    let raw = &after_marker[bucket_at + needle.len()..];
    let raw = raw.split(['?', '#']).next().unwrap_or(raw);

    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

/// Reject object paths that could escape a bucket or confuse a backend.
pub fn validate_object_path(path: &str) -> StorageResult<()> {
    if path.is_empty() {
        return Err(StorageError::InvalidKey("Storage path is empty".to_string()));
    }
    if path.starts_with('/')
        || path.contains('\\')
        || path.contains('\0')
        || path.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..")
    {
        return Err(StorageError::InvalidKey(format!(
            "Storage path contains invalid segments: {}",
            path
        )));
    }
    Ok(())
}

/// Bucket names are single path segments.
pub fn validate_bucket_name(name: &str) -> StorageResult<()> {
    if name.is_empty()
        || name.starts_with('.')
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
    {
        return Err(StorageError::InvalidKey(format!(
            "Invalid bucket name: {:?}",
            name
        )));
    }
    Ok(())
}
