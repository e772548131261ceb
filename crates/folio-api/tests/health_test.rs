//! Health and documentation route tests.
//!
//! Run with: `cargo test -p folio-api --test health_test`

mod helpers;

use axum::http::StatusCode;
use folio_core::SiteConfig;
use helpers::stores::UnreachableStore;
use helpers::{setup_test_app, test_server};
use serde_json::Value;
use std::sync::Arc;

#[tokio::test]
async fn test_liveness() {
    let app = setup_test_app().await;

    let response = app.client().get("/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["status"], "alive");
}

#[tokio::test]
async fn test_readiness_with_reachable_store() {
    let app = setup_test_app().await;

    let response = app.client().get("/ready").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<Value>();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["storage"], "ready");
    assert_eq!(body["backend"], "memory");
}

#[tokio::test]
async fn test_readiness_with_unreachable_store() {
    let server = test_server(SiteConfig::in_memory(), Arc::new(UnreachableStore::default()));

    let response = server.get("/ready").await;

    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    let body = response.json::<Value>();
    assert_eq!(body["status"], "not_ready");
    assert!(body["storage"]
        .as_str()
        .unwrap()
        .contains("connection refused"));
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = setup_test_app().await;

    let response = app.client().get("/api/openapi.json").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<Value>();
    assert!(body["paths"].get("/api/media").is_some());
    assert!(body["paths"].get("/api/storage/init").is_some());
}

#[tokio::test]
async fn test_readiness_hides_store_error_in_production() {
    let mut site = SiteConfig::in_memory();
    site.base.environment = "production".to_string();
    let server = test_server(site, Arc::new(UnreachableStore::default()));

    let response = server.get("/ready").await;

    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    let body = response.json::<Value>();
    assert_eq!(body["storage"], "not_ready");
}
