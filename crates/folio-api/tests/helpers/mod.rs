//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p folio-api`. Every helper runs against the
//! in-memory store unless a test passes its own.

#![allow(dead_code)]

pub mod fixtures;
pub mod stores;

use axum_test::TestServer;
use folio_api::constants;
use folio_api::setup::{build_state, routes};
use folio_core::{Config, SiteConfig};
use folio_services::{MemoryStorage, ObjectStore};
use std::sync::Arc;

/// API path prefix for tests (e.g. `/api`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server plus the store behind it.
pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<MemoryStorage>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

/// Setup test app backed by a fresh in-memory store.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with_config(SiteConfig::in_memory()).await
}

pub async fn setup_test_app_with_config(site: SiteConfig) -> TestApp {
    let store = Arc::new(MemoryStorage::new());
    let server = test_server(site, store.clone());
    TestApp { server, store }
}

/// Test server over any store.
pub fn test_server(site: SiteConfig, store: Arc<dyn ObjectStore>) -> TestServer {
    let state = build_state(Config::new(site), store).expect("Failed to build app state");
    let router = routes::setup_routes(state).expect("Failed to build router");
    TestServer::new(router).expect("Failed to start test server")
}
