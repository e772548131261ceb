//! Render-time guards for user-supplied image references.
//!
//! A reference is *safe* when it is empty, root-relative, or a well-formed absolute
//! URL. Safety says nothing about what the URL points at: a page URL is safe but is
//! not a valid image. Nothing in this module touches the network or panics.

use serde::Serialize;
use url::Url;

use crate::constants::PLACEHOLDER_IMAGE_PATH;

/// Whether a reference can be handed to a rendering surface as-is.
pub fn is_safe_image_reference(reference: Option<&str>) -> bool {
    match reference {
        None => true,
        Some(r) if r.is_empty() || r.starts_with('/') => true,
        Some(r) => Url::parse(r).is_ok(),
    }
}

/// Return a URL that is always fit to render, substituting the placeholder.
pub fn get_safe_image_url(reference: Option<&str>) -> String {
    get_safe_image_url_or(reference, PLACEHOLDER_IMAGE_PATH)
}

/// Same as [`get_safe_image_url`] with a caller-chosen placeholder.
pub fn get_safe_image_url_or(reference: Option<&str>, placeholder: &str) -> String {
    match reference {
        None => placeholder.to_string(),
        Some(r) if r.is_empty() => placeholder.to_string(),
        // Relative paths are served by the site itself and are trusted without parsing.
        Some(r) if r.starts_with('/') => r.to_string(),
        Some(r) => match Url::parse(r) {
            Ok(_) => r.to_string(),
            Err(_) => placeholder.to_string(),
        },
    }
}

/// What a display surface should draw for an image slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RenderSource {
    Image { url: String },
    /// No source at all: draw the first letter of the alt text instead.
    Fallback { initial: String },
}

pub fn resolve_render_source(src: Option<&str>, alt: &str) -> RenderSource {
    match src {
        Some(s) if !s.is_empty() => RenderSource::Image {
            url: get_safe_image_url(Some(s)),
        },
        _ => RenderSource::Fallback {
            initial: alt.chars().next().map(String::from).unwrap_or_default(),
        },
    }
}
