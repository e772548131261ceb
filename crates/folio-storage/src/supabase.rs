use crate::traits::{ObjectStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use folio_core::constants::PUBLIC_OBJECT_MARKER;
use folio_core::{BucketInfo, BucketOptions, UploadOptions};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Supabase Storage implementation over its REST API
#[derive(Clone)]
pub struct SupabaseStorage {
    client: Client,
    /// Project URL without trailing slash, e.g. `https://abc.supabase.co`
    base_url: String,
    service_key: String,
}

#[derive(Serialize)]
struct CreateBucketRequest<'a> {
    id: &'a str,
    name: &'a str,
    public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_size_limit: Option<u64>,
}

#[derive(Serialize)]
struct RemoveRequest<'a> {
    prefixes: &'a [String],
}

#[derive(Deserialize)]
struct BucketRecord {
    name: String,
    #[serde(default)]
    public: bool,
    #[serde(default)]
    file_size_limit: Option<u64>,
}

/// Error body returned by the storage API, e.g.
/// `{"statusCode":"409","error":"Duplicate","message":"The resource already exists"}`
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(rename = "statusCode", default)]
    status_code: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ApiErrorBody {
    fn is_conflict(&self, status: StatusCode) -> bool {
        if status == StatusCode::CONFLICT {
            return true;
        }
        let code_is_409 = match &self.status_code {
            Some(serde_json::Value::String(s)) => s == "409",
            Some(serde_json::Value::Number(n)) => n.as_u64() == Some(409),
            _ => false,
        };
        code_is_409
            || self.error.as_deref() == Some("Duplicate")
            || self
                .message
                .as_deref()
                .is_some_and(|m| m.to_lowercase().contains("already exists"))
    }

    fn is_not_found(&self, status: StatusCode) -> bool {
        status == StatusCode::NOT_FOUND
            || self
                .message
                .as_deref()
                .is_some_and(|m| m.to_lowercase().contains("not found"))
    }

    fn describe(&self, status: StatusCode) -> String {
        match (&self.error, &self.message) {
            (Some(e), Some(m)) => format!("{} ({}): {}", status, e, m),
            (None, Some(m)) => format!("{}: {}", status, m),
            (Some(e), None) => format!("{} ({})", status, e),
            (None, None) => status.to_string(),
        }
    }
}

async fn error_body(response: Response) -> (StatusCode, ApiErrorBody) {
    let status = response.status();
    let body = response
        .bytes()
        .await
        .ok()
        .and_then(|b| serde_json::from_slice::<ApiErrorBody>(&b).ok())
        .unwrap_or_default();
    (status, body)
}

fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

impl SupabaseStorage {
    /// Create a new SupabaseStorage instance
    ///
    /// # Arguments
    /// * `base_url` - Project URL (e.g., "https://abc.supabase.co")
    /// * `service_key` - Service-role key; sent as `apikey` and as bearer token
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> StorageResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let service_key = service_key.into();

        if base_url.is_empty() {
            return Err(StorageError::ConfigError(
                "SUPABASE_URL not configured".to_string(),
            ));
        }
        if service_key.is_empty() {
            return Err(StorageError::ConfigError(
                "SUPABASE_SERVICE_ROLE_KEY not configured".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(SupabaseStorage {
            client,
            base_url,
            service_key,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/storage/v1/{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }
}

#[async_trait]
impl ObjectStore for SupabaseStorage {
    async fn list_buckets(&self) -> StorageResult<Vec<BucketInfo>> {
        let response = self
            .authorized(self.client.get(self.endpoint("bucket")))
            .send()
            .await
            .map_err(|e| StorageError::ListFailed(e.to_string()))?;

        if !response.status().is_success() {
            let (status, body) = error_body(response).await;
            return Err(StorageError::ListFailed(body.describe(status)));
        }

        let records: Vec<BucketRecord> = response
            .json()
            .await
            .map_err(|e| StorageError::ListFailed(format!("Unexpected bucket list: {}", e)))?;

        Ok(records
            .into_iter()
            .map(|r| BucketInfo {
                name: r.name,
                public: r.public,
                file_size_limit: r.file_size_limit,
            })
            .collect())
    }

    async fn create_bucket(&self, name: &str, options: BucketOptions) -> StorageResult<()> {
        let request = CreateBucketRequest {
            id: name,
            name,
            public: options.public,
            file_size_limit: options.file_size_limit,
        };

        let response = self
            .authorized(self.client.post(self.endpoint("bucket")))
            .json(&request)
            .send()
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?;

        if response.status().is_success() {
            tracing::info!(bucket = %name, public = options.public, "Supabase bucket created");
            return Ok(());
        }

        let (status, body) = error_body(response).await;
        if body.is_conflict(status) {
            return Err(StorageError::BucketAlreadyExists(name.to_string()));
        }
        Err(StorageError::BackendError(body.describe(status)))
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Vec<u8>,
        options: &UploadOptions,
    ) -> StorageResult<()> {
        crate::keys::validate_object_path(path)?;

        let size = data.len();
        let start = std::time::Instant::now();
        let url = self.endpoint(&format!("object/{}/{}", bucket, encode_path(path)));

        let response = self
            .authorized(self.client.post(url))
            .header(
                reqwest::header::CACHE_CONTROL,
                format!("max-age={}", options.cache_control),
            )
            .header(reqwest::header::CONTENT_TYPE, &options.content_type)
            .header("x-upsert", if options.upsert { "true" } else { "false" })
            .body(data)
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        if !response.status().is_success() {
            let (status, body) = error_body(response).await;
            if body.is_conflict(status) {
                return Err(StorageError::ObjectAlreadyExists(path.to_string()));
            }
            if status == StatusCode::PAYLOAD_TOO_LARGE {
                return Err(StorageError::PayloadTooLarge(body.describe(status)));
            }
            if body.is_not_found(status) {
                return Err(StorageError::BucketNotFound(bucket.to_string()));
            }
            return Err(StorageError::UploadFailed(body.describe(status)));
        }

        tracing::info!(
            bucket = %bucket,
            key = %path,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Supabase upload successful"
        );

        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base_url, PUBLIC_OBJECT_MARKER, bucket, path
        )
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> StorageResult<()> {
        let start = std::time::Instant::now();

        let response = self
            .authorized(self.client.delete(self.endpoint(&format!("object/{}", bucket))))
            .json(&RemoveRequest { prefixes: paths })
            .send()
            .await
            .map_err(|e| StorageError::DeleteFailed(e.to_string()))?;

        if !response.status().is_success() {
            let (status, body) = error_body(response).await;
            return Err(StorageError::DeleteFailed(body.describe(status)));
        }

        tracing::info!(
            bucket = %bucket,
            count = paths.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Supabase delete successful"
        );

        Ok(())
    }

    fn public_url_marker(&self) -> &str {
        PUBLIC_OBJECT_MARKER
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Supabase
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const KEY: &str = "service-role-key";

    fn storage(server: &mockito::ServerGuard) -> SupabaseStorage {
        SupabaseStorage::new(server.url(), KEY).unwrap()
    }

    #[tokio::test]
    async fn test_list_buckets_sends_credentials() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/storage/v1/bucket")
            .match_header("apikey", KEY)
            .match_header("authorization", format!("Bearer {}", KEY).as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"id":"media","name":"media","public":true,"file_size_limit":10485760,"owner":""}]"#,
            )
            .create_async()
            .await;

        let buckets = storage(&server).list_buckets().await.unwrap();
        mock.assert_async().await;
        assert_eq!(
            buckets,
            vec![BucketInfo {
                name: "media".to_string(),
                public: true,
                file_size_limit: Some(10_485_760),
            }]
        );
    }

    #[tokio::test]
    async fn test_list_buckets_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/storage/v1/bucket")
            .with_status(500)
            .with_body(r#"{"statusCode":"500","error":"Internal","message":"db down"}"#)
            .create_async()
            .await;

        let err = storage(&server).list_buckets().await.unwrap_err();
        assert!(matches!(err, StorageError::ListFailed(msg) if msg.contains("db down")));
    }

    #[tokio::test]
    async fn test_create_bucket_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/storage/v1/bucket")
            .match_body(Matcher::Json(serde_json::json!({
                "id": "media",
                "name": "media",
                "public": true,
                "file_size_limit": 10485760
            })))
            .with_status(200)
            .with_body(r#"{"name":"media"}"#)
            .create_async()
            .await;

        storage(&server)
            .create_bucket(
                "media",
                BucketOptions {
                    public: true,
                    file_size_limit: Some(10_485_760),
                },
            )
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_bucket_duplicate_maps_to_already_exists() {
        let mut server = mockito::Server::new_async().await;
        // The API reports duplicates with HTTP 400 and a 409 statusCode in the body.
        server
            .mock("POST", "/storage/v1/bucket")
            .with_status(400)
            .with_body(
                r#"{"statusCode":"409","error":"Duplicate","message":"The resource already exists"}"#,
            )
            .create_async()
            .await;

        let err = storage(&server)
            .create_bucket(
                "media",
                BucketOptions {
                    public: true,
                    file_size_limit: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::BucketAlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_upload_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/storage/v1/object/media/images/abc_1.png")
            .match_header("cache-control", "max-age=3600")
            .match_header("x-upsert", "false")
            .match_header("content-type", "image/png")
            .match_body("png-bytes")
            .with_status(200)
            .with_body(r#"{"Key":"media/images/abc_1.png"}"#)
            .create_async()
            .await;

        let options = UploadOptions {
            content_type: "image/png".to_string(),
            ..UploadOptions::default()
        };
        storage(&server)
            .upload("media", "images/abc_1.png", b"png-bytes".to_vec(), &options)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upload_conflict() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/storage/v1/object/media/a.png")
            .with_status(409)
            .with_body(r#"{"statusCode":"409","error":"Duplicate","message":"The resource already exists"}"#)
            .create_async()
            .await;

        let err = storage(&server)
            .upload("media", "a.png", b"x".to_vec(), &UploadOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::ObjectAlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_remove_sends_prefixes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/storage/v1/object/media")
            .match_body(Matcher::Json(serde_json::json!({
                "prefixes": ["images/a.png"]
            })))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        storage(&server)
            .remove("media", &["images/a.png".to_string()])
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[test]
    fn test_public_url() {
        let storage = SupabaseStorage::new("https://abc.supabase.co/", KEY).unwrap();
        let url = storage.public_url("media", "images/a.png");
        assert_eq!(
            url,
            "https://abc.supabase.co/storage/v1/object/public/media/images/a.png"
        );
        assert!(url.contains(storage.public_url_marker()));
    }

    #[test]
    fn test_missing_credentials() {
        assert!(matches!(
            SupabaseStorage::new("https://abc.supabase.co", ""),
            Err(StorageError::ConfigError(_))
        ));
    }
}
