//! Folio Services Layer
//!
//! This crate is the **business service layer**: the media upload pipeline and the
//! live image-URL check. It re-exports the storage API so that the API crate depends
//! on a single service facade. Keep orchestration here; keep thin HTTP handling in
//! folio-api.

pub mod image_validator;
pub mod media_storage;
pub mod ssrf;

pub use folio_storage::{
    create_storage, MemoryStorage, ObjectStore, StorageBackend, StorageError, StorageResult,
};
pub use image_validator::{HeadProbe, HttpProbe, ImageValidator, ProbeError, ProbeResponse};
pub use media_storage::{BootstrapError, BucketBootstrap, MediaStorageService, UploadedObject};
