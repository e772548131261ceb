//! Data models shared by the storage, service, and API crates.

mod media;
mod storage;

pub use media::{MediaCategory, UploadTarget};
pub use storage::{BucketInfo, BucketOptions, UploadOptions};
