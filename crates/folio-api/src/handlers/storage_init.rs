use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use folio_services::BootstrapError;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StorageInitResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether the bucket was already present before this call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_exists: Option<bool>,
}

impl StorageInitResponse {
    fn failed(error: &str) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.to_string()),
            bucket_exists: None,
        }
    }
}

/// Make sure the media bucket exists, creating it public with the configured size limit.
#[utoipa::path(
    post,
    path = "/api/storage/init",
    tag = "storage",
    responses(
        (status = 200, description = "Storage initialized", body = StorageInitResponse),
        (status = 500, description = "Bucket could not be listed or created", body = StorageInitResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "storage_init"))]
pub async fn init_storage(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.media.bootstrap_bucket().await {
        Ok(bootstrap) => {
            tracing::info!(
                bucket = %state.media.bucket(),
                existed = bootstrap.existed,
                "Storage initialized"
            );
            (
                StatusCode::OK,
                Json(StorageInitResponse {
                    success: true,
                    message: Some("Storage initialized successfully".to_string()),
                    error: None,
                    bucket_exists: Some(bootstrap.existed),
                }),
            )
        }
        Err(e) => {
            tracing::error!(bucket = %state.media.bucket(), error = %e, "Storage initialization failed");
            let error = match e {
                BootstrapError::ListFailed(_) => "Failed to list storage buckets",
                BootstrapError::CreateFailed(_) => "Failed to create storage bucket",
            };
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StorageInitResponse::failed(error)),
            )
        }
    }
}
