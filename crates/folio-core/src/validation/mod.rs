//! Validation modules
//!
//! Everything here is synchronous and free of I/O. The live, network-bound image
//! check lives in `folio-services`.

pub mod image_ref;
pub mod upload_gate;

pub use image_ref::{
    get_safe_image_url, get_safe_image_url_or, is_safe_image_reference, resolve_render_source,
    RenderSource,
};
pub use upload_gate::{GateError, UploadGate};
