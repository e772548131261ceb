use crate::constants::STORAGE_NOT_READY_MESSAGE;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::extract_multipart_file;
use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use folio_core::{AppError, UploadGate, UploadTarget};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

#[derive(Debug, Deserialize, Validate, IntoParams)]
pub struct UploadQuery {
    /// Accept pattern for this upload (e.g. `image/*`, `.pdf`); defaults to the configured one.
    /// Only patterns from `UPLOAD_ALLOWED_ACCEPTS` are honored.
    #[validate(length(min = 1, max = 256))]
    pub accept: Option<String>,
    /// Folder inside the bucket; defaults to the folder for the file's category.
    #[validate(length(min = 1, max = 128), custom(function = validate_folder))]
    pub folder: Option<String>,
}

fn validate_folder(folder: &str) -> Result<(), ValidationError> {
    let valid = folder
        .trim_matches('/')
        .split('/')
        .all(|segment| {
            !segment.is_empty()
                && segment != "."
                && segment != ".."
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        });
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_folder"))
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadMediaResponse {
    /// Public URL of the stored object.
    pub url: String,
    /// Storage path inside the bucket.
    pub path: String,
    pub size_bytes: u64,
    /// e.g. "Image uploaded successfully".
    pub message: String,
}

/// Upload one file into the media bucket.
///
/// The file must pass the size and type gate before anything is sent to storage.
#[utoipa::path(
    post,
    path = "/api/media",
    tag = "media",
    params(UploadQuery),
    request_body(content_type = "multipart/form-data", description = "Single field named `file`"),
    responses(
        (status = 201, description = "File uploaded", body = UploadMediaResponse),
        (status = 400, description = "Empty file or invalid request", body = ErrorResponse),
        (status = 409, description = "Generated path already taken", body = ErrorResponse),
        (status = 413, description = "File exceeds the upload limit", body = ErrorResponse),
        (status = 415, description = "File type or requested accept pattern not allowed", body = ErrorResponse),
        (status = 502, description = "Storage transfer failed", body = ErrorResponse),
        (status = 503, description = "Storage not initialized", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_media"))]
pub async fn upload_media(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UploadQuery>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    query.validate()?;

    let (data, original_filename, content_type) = extract_multipart_file(multipart).await?;

    let gate = UploadGate::for_request(
        state.config.max_upload_size_bytes(),
        state.config.default_upload_accept(),
        state.config.upload_allowed_accepts(),
        query.accept.as_deref(),
    )?;
    let category = gate.check(&original_filename, &content_type, data.len() as u64)?;

    if let Err(e) = state.media.bootstrap_bucket().await {
        tracing::warn!(bucket = %state.media.bucket(), error = %e, "Rejecting upload, storage not ready");
        return Err(AppError::StorageUnavailable(STORAGE_NOT_READY_MESSAGE.to_string()).into());
    }

    let folder = query.folder.as_deref().unwrap_or(category.folder());
    let target = UploadTarget::new(original_filename, content_type, category, data);
    let uploaded = state.media.try_upload(target, None, Some(folder)).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadMediaResponse {
            url: uploaded.public_url,
            path: uploaded.path,
            size_bytes: uploaded.size_bytes,
            message: format!("{} uploaded successfully", category.label()),
        }),
    ))
}
