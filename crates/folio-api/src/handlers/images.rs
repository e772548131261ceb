//! Profile image reference checks.
//!
//! `validate` is the save-time check behind the profile form; `safe` is the
//! render-time fallback and never makes a network request.

use crate::constants::INVALID_IMAGE_URL_MESSAGE;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use folio_core::get_safe_image_url_or;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ValidateImageRequest {
    #[validate(length(max = 2048))]
    pub url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ValidateImageResponse {
    /// Whether a HEAD request found an image at `url`.
    pub valid: bool,
    /// What the page should render for this reference.
    pub safe_url: String,
    /// Form message; present only when a non-empty reference fails the check.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SafeImageQuery {
    pub url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SafeImageResponse {
    pub url: String,
}

/// Check that a reference serves an image before the profile form saves it.
#[utoipa::path(
    post,
    path = "/api/images/validate",
    tag = "images",
    request_body = ValidateImageRequest,
    responses(
        (status = 200, description = "Check completed", body = ValidateImageResponse),
        (status = 400, description = "Invalid request body", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(operation = "validate_image"))]
pub async fn validate_image(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<ValidateImageRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate()?;

    let reference = request.url.trim();
    let valid = state.images.is_valid_image_url(reference).await;
    let message = (!reference.is_empty() && !valid).then(|| INVALID_IMAGE_URL_MESSAGE.to_string());
    let safe_url = get_safe_image_url_or(
        Some(reference),
        state.config.placeholder_image_path(),
    );

    Ok(Json(ValidateImageResponse {
        valid,
        safe_url,
        message,
    }))
}

/// Resolve a stored reference to something the page can render.
#[utoipa::path(
    get,
    path = "/api/images/safe",
    tag = "images",
    params(SafeImageQuery),
    responses(
        (status = 200, description = "Render-safe reference", body = SafeImageResponse)
    )
)]
pub async fn safe_image(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SafeImageQuery>,
) -> impl IntoResponse {
    Json(SafeImageResponse {
        url: get_safe_image_url_or(query.url.as_deref(), state.config.placeholder_image_path()),
    })
}
