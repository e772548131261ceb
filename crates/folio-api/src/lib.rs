//! Folio API Library
//!
//! This crate provides the HTTP handlers and application setup for the media
//! pipeline: storage bootstrap, gated uploads, deletes, and image reference checks.

// Module declarations
mod api_doc;
pub mod constants;
mod handlers;
pub mod setup;
mod telemetry;
mod utils;

// Public modules
pub mod error;
pub mod state;

// Re-exports
pub use api_doc::ApiDoc;
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
