//! Folio Storage Library
//!
//! This crate provides the object-store abstraction used by the media pipeline and
//! its implementations: the hosted Supabase Storage REST API, the local filesystem,
//! and an in-process store for development and tests.
//!
//! # Storage path format
//!
//! Objects live in a bucket at `{folder}/{token}_{timestamp_ms}.{extension}`, for
//! example `images/k3j9x0q2m7a1z_1718000000000.png`. Paths must not contain `..`,
//! a leading `/`, or backslashes. Path generation and the reverse mapping from a
//! public URL back to a path are centralized in the `keys` module so all backends
//! stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod memory;
#[cfg(feature = "storage-supabase")]
pub mod supabase;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use folio_core::StorageBackend;
pub use keys::{extract_storage_path, generate_storage_path};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use memory::MemoryStorage;
#[cfg(feature = "storage-supabase")]
pub use supabase::SupabaseStorage;
pub use traits::{ObjectStore, StorageError, StorageResult};
