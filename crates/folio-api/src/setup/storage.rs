//! Storage setup and initialization

use anyhow::{Context, Result};
use folio_core::Config;
use folio_services::{create_storage, MediaStorageService, ObjectStore};
use std::sync::Arc;

/// Build the configured object store.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn ObjectStore>> {
    tracing::info!("Initializing storage backend...");
    let store = create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;
    tracing::info!(
        backend = %store.backend_type(),
        bucket = %config.media_bucket(),
        "Storage backend initialized successfully"
    );
    Ok(store)
}

/// Create the media bucket if it is missing.
///
/// Best effort: a store that is down at startup must not keep the server from
/// starting, and `POST /api/storage/init` retries the same bootstrap later.
pub async fn bootstrap_media_bucket(media: &MediaStorageService) {
    match media.bootstrap_bucket().await {
        Ok(bootstrap) => tracing::info!(
            bucket = %media.bucket(),
            existed = bootstrap.existed,
            "Media bucket ready"
        ),
        Err(e) => tracing::warn!(
            bucket = %media.bucket(),
            error = %e,
            "Media bucket bootstrap failed at startup"
        ),
    }
}
