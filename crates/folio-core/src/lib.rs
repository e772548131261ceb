//! Folio Core Library
//!
//! This crate provides the domain models, error types, configuration, and the
//! synchronous validation rules shared by the storage, service, and API crates.

pub mod config;
pub mod constants;
pub mod content;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::{BaseConfig, Config, SiteConfig};
pub use content::{group_skills_by_category, slugify, Skill};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{BucketInfo, BucketOptions, MediaCategory, UploadOptions, UploadTarget};
pub use storage_types::StorageBackend;
pub use validation::{
    get_safe_image_url, get_safe_image_url_or, is_safe_image_reference, resolve_render_source,
    GateError, RenderSource, UploadGate,
};
