//! Application setup and initialization
//!
//! This module contains all application initialization logic extracted from main.rs
//! for better organization and testability.

pub mod routes;
pub mod server;
pub mod storage;
pub mod validation;

use crate::state::AppState;
use anyhow::{Context, Result};
use folio_core::Config;
use folio_services::{ImageValidator, MediaStorageService, ObjectStore};
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry();

    // Validate configuration first - fail fast on misconfiguration
    validation::validate_config(&config).context("Configuration validation failed")?;
    tracing::info!(
        environment = %config.environment(),
        backend = %config.storage_backend(),
        "Configuration loaded and validated successfully"
    );

    let store = storage::setup_storage(&config).await?;
    let state = build_state(config, store)?;
    storage::bootstrap_media_bucket(&state.media).await;

    let router = routes::setup_routes(state.clone())?;

    Ok((state, router))
}

/// Wire the services on top of an existing store.
pub fn build_state(config: Config, store: Arc<dyn ObjectStore>) -> Result<Arc<AppState>> {
    let media = MediaStorageService::from_config(store, &config);
    let images = ImageValidator::from_config(&config).context("Failed to build image probe")?;

    Ok(Arc::new(AppState {
        config,
        media,
        images,
    }))
}
