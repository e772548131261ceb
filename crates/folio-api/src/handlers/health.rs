//! Health check handlers.

use crate::constants::READINESS_TIMEOUT_SECS;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use std::time::Duration;

/// Liveness probe - process is running.
pub async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "alive" })),
    )
}

/// Readiness probe - the object store answers a bucket listing.
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timeout = Duration::from_secs(READINESS_TIMEOUT_SECS);

    let (ready, storage) =
        match tokio::time::timeout(timeout, state.media.store().list_buckets()).await {
            Ok(Ok(_)) => (true, "ready".to_string()),
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Storage readiness check failed");
                if state.config.is_production() {
                    (false, "not_ready".to_string())
                } else {
                    (false, format!("not_ready: {}", e))
                }
            }
            Err(_) => {
                tracing::error!("Storage readiness check timed out");
                (false, "timeout".to_string())
            }
        };

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = serde_json::json!({
        "status": if ready { "ready" } else { "not_ready" },
        "storage": storage,
        "backend": state.media.store().backend_type().to_string(),
    });

    (status, Json(body))
}
