use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DeleteMediaRequest {
    /// Public URL returned by the upload, or a bare storage path.
    #[validate(length(max = 2048))]
    pub url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteMediaResponse {
    pub success: bool,
}

/// Remove a stored object by its public URL or path.
///
/// An empty `url` and an object that is already gone both count as success.
#[utoipa::path(
    delete,
    path = "/api/media",
    tag = "media",
    request_body = DeleteMediaRequest,
    responses(
        (status = 200, description = "Object removed", body = DeleteMediaResponse),
        (status = 400, description = "Invalid request body", body = ErrorResponse),
        (status = 502, description = "Storage rejected the delete", body = DeleteMediaResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(operation = "delete_media"))]
pub async fn delete_media(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<DeleteMediaRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate()?;

    let success = state.media.delete_file(&request.url, None).await;
    let status = if success {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    };

    Ok((status, Json(DeleteMediaResponse { success })))
}
