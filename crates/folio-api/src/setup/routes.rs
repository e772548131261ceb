//! Route configuration and setup

use crate::constants::{API_PREFIX, BODY_TOO_LARGE_MESSAGE, MULTIPART_OVERHEAD_BYTES};
use crate::error::HttpAppError;
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use folio_core::{AppError, Config};
use std::sync::Arc;
use std::time::Duration;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Setup all application routes
pub fn setup_routes(state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let config = &state.config;
    let cors = setup_cors(config)?;

    // Multipart framing adds a little on top of the largest object the bucket takes.
    let body_limit = usize::try_from(
        config
            .bucket_file_size_limit_bytes()
            .saturating_add(MULTIPART_OVERHEAD_BYTES),
    )?;

    let http_concurrency_limit = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(1_000)
        .max(1);
    tracing::info!(
        http_concurrency_limit,
        body_limit,
        request_timeout_secs = config.request_timeout_secs(),
        "HTTP limits configured"
    );

    let app = Router::new()
        .merge(health_routes())
        .merge(storage_routes())
        .merge(media_routes(body_limit))
        .merge(image_routes())
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::ApiDoc::openapi()) }),
        )
        .with_state(state.clone())
        .merge(utoipa_rapidoc::RapiDoc::new("/api/openapi.json").path("/docs"))
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(middleware::map_response(json_payload_too_large))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs(),
        )))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

/// `RequestBodyLimitLayer` rejects by `Content-Length` with a plain-text 413; reshape it as an API error.
async fn json_payload_too_large(response: Response) -> Response {
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));

    if response.status() == StatusCode::PAYLOAD_TOO_LARGE && !is_json {
        return HttpAppError(AppError::PayloadTooLarge(BODY_TOO_LARGE_MESSAGE.to_string()))
            .into_response();
    }
    response
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];

    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}

fn health_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health::liveness_check))
        .route("/ready", get(handlers::health::readiness_check))
}

fn storage_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        &format!("{}/storage/init", API_PREFIX),
        post(handlers::storage_init::init_storage),
    )
}

fn media_routes(body_limit: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/media", API_PREFIX),
            post(handlers::media_upload::upload_media)
                .delete(handlers::media_delete::delete_media),
        )
        .layer(DefaultBodyLimit::max(body_limit))
}

fn image_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/images/validate", API_PREFIX),
            post(handlers::images::validate_image),
        )
        .route(
            &format!("{}/images/safe", API_PREFIX),
            get(handlers::images::safe_image),
        )
}
