//! Configuration module
//!
//! This module provides the configuration for the API server and the media
//! pipeline: server settings, storage backend selection, upload limits, and the
//! image probe.

use std::env;

use crate::constants::{
    BUCKET_FILE_SIZE_LIMIT_BYTES, DEFAULT_BUCKET, DEFAULT_CACHE_CONTROL,
    DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_UPLOAD_ACCEPT, DEFAULT_UPLOAD_ALLOWED_ACCEPTS,
    PLACEHOLDER_IMAGE_PATH,
};
use crate::storage_types::StorageBackend;

const DEFAULT_PORT: u16 = 4000;
const REQUEST_TIMEOUT_SECS: u64 = 60;
const IMAGE_PROBE_TIMEOUT_SECS: u64 = 10;
const BYTES_PER_MB: u64 = 1024 * 1024;

/// Server settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub request_timeout_secs: u64,
}

/// Site configuration: server plus media pipeline.
#[derive(Clone, Debug)]
pub struct SiteConfig {
    pub base: BaseConfig,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub supabase_url: Option<String>,
    pub supabase_service_role_key: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub media_bucket: String,
    pub bucket_file_size_limit_bytes: u64,
    // Upload configuration
    pub max_upload_size_bytes: u64,
    pub default_upload_accept: String,
    /// Accept patterns a request may pick instead of the default.
    pub upload_allowed_accepts: Vec<String>,
    pub upload_cache_control: String,
    // Image references
    pub placeholder_image_path: String,
    pub image_probe_timeout_secs: u64,
    /// Lets the image probe reach loopback and private addresses. Development only.
    pub image_probe_allow_private: bool,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<SiteConfig>);

impl Config {
    pub fn new(config: SiteConfig) -> Self {
        Config(Box::new(config))
    }

    fn as_site(&self) -> &SiteConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_env(&self.as_site().base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = SiteConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_site().validate()
    }

    // Convenience getters for common fields
    pub fn server_port(&self) -> u16 {
        self.as_site().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_site().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.as_site().base.environment
    }

    pub fn request_timeout_secs(&self) -> u64 {
        self.as_site().base.request_timeout_secs
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.as_site().storage_backend
    }

    pub fn supabase_url(&self) -> Option<&str> {
        self.as_site().supabase_url.as_deref()
    }

    pub fn supabase_service_role_key(&self) -> Option<&str> {
        self.as_site().supabase_service_role_key.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.as_site().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.as_site().local_storage_base_url.as_deref()
    }

    pub fn media_bucket(&self) -> &str {
        &self.as_site().media_bucket
    }

    pub fn bucket_file_size_limit_bytes(&self) -> u64 {
        self.as_site().bucket_file_size_limit_bytes
    }

    pub fn max_upload_size_bytes(&self) -> u64 {
        self.as_site().max_upload_size_bytes
    }

    pub fn default_upload_accept(&self) -> &str {
        &self.as_site().default_upload_accept
    }

    pub fn upload_allowed_accepts(&self) -> &[String] {
        &self.as_site().upload_allowed_accepts
    }

    pub fn upload_cache_control(&self) -> &str {
        &self.as_site().upload_cache_control
    }

    pub fn placeholder_image_path(&self) -> &str {
        &self.as_site().placeholder_image_path
    }

    pub fn image_probe_timeout_secs(&self) -> u64 {
        self.as_site().image_probe_timeout_secs
    }

    pub fn image_probe_allow_private(&self) -> bool {
        self.as_site().image_probe_allow_private
    }
}

fn is_production_env(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn megabytes_to_bytes(name: &str, mb: u64) -> Result<u64, anyhow::Error> {
    mb.checked_mul(BYTES_PER_MB)
        .ok_or_else(|| anyhow::anyhow!("{} is too large ({} MB)", name, mb))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl SiteConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source. `from_env` passes the process environment.
    pub fn from_lookup<F>(var: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins_str = var("CORS_ORIGINS").unwrap_or_else(|| "*".to_string());
        if is_production_env(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins = split_list(&cors_origins_str);

        let base = BaseConfig {
            server_port: match var("PORT") {
                Some(port) => port
                    .trim()
                    .parse()
                    .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
                None => DEFAULT_PORT,
            },
            cors_origins,
            environment,
            request_timeout_secs: parse_or(var("REQUEST_TIMEOUT_SECS"), REQUEST_TIMEOUT_SECS),
        };

        let storage_backend = match var("STORAGE_BACKEND") {
            Some(s) => s.parse::<StorageBackend>()?,
            None => StorageBackend::Supabase,
        };

        let default_bucket_limit_mb = BUCKET_FILE_SIZE_LIMIT_BYTES / BYTES_PER_MB;
        let default_upload_mb = DEFAULT_MAX_UPLOAD_BYTES / BYTES_PER_MB;

        let config = SiteConfig {
            base,
            storage_backend,
            supabase_url: var("SUPABASE_URL")
                .map(|s| s.trim().trim_end_matches('/').to_string())
                .filter(|s| !s.is_empty()),
            supabase_service_role_key: var("SUPABASE_SERVICE_ROLE_KEY").filter(|s| !s.is_empty()),
            local_storage_path: var("LOCAL_STORAGE_PATH").filter(|s| !s.is_empty()),
            local_storage_base_url: var("LOCAL_STORAGE_BASE_URL")
                .map(|s| s.trim().trim_end_matches('/').to_string())
                .filter(|s| !s.is_empty()),
            media_bucket: var("MEDIA_BUCKET")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            bucket_file_size_limit_bytes: megabytes_to_bytes(
                "BUCKET_FILE_SIZE_LIMIT_MB",
                parse_or(var("BUCKET_FILE_SIZE_LIMIT_MB"), default_bucket_limit_mb),
            )?,
            max_upload_size_bytes: megabytes_to_bytes(
                "MAX_UPLOAD_SIZE_MB",
                parse_or(var("MAX_UPLOAD_SIZE_MB"), default_upload_mb),
            )?,
            default_upload_accept: var("DEFAULT_UPLOAD_ACCEPT")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_UPLOAD_ACCEPT.to_string()),
            upload_allowed_accepts: split_list(
                &var("UPLOAD_ALLOWED_ACCEPTS")
                    .unwrap_or_else(|| DEFAULT_UPLOAD_ALLOWED_ACCEPTS.to_string()),
            ),
            upload_cache_control: var("UPLOAD_CACHE_CONTROL")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CACHE_CONTROL.to_string()),
            placeholder_image_path: var("PLACEHOLDER_IMAGE_PATH")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| PLACEHOLDER_IMAGE_PATH.to_string()),
            image_probe_timeout_secs: parse_or(
                var("IMAGE_PROBE_TIMEOUT_SECS"),
                IMAGE_PROBE_TIMEOUT_SECS,
            ),
            image_probe_allow_private: var("IMAGE_PROBE_ALLOW_PRIVATE")
                .unwrap_or_else(|| "false".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(false),
        };

        config.validate()?;
        Ok(config)
    }

    /// Development configuration backed by the in-process store.
    pub fn in_memory() -> Self {
        SiteConfig {
            base: BaseConfig {
                server_port: DEFAULT_PORT,
                cors_origins: vec!["*".to_string()],
                environment: "development".to_string(),
                request_timeout_secs: REQUEST_TIMEOUT_SECS,
            },
            storage_backend: StorageBackend::Memory,
            supabase_url: None,
            supabase_service_role_key: None,
            local_storage_path: None,
            local_storage_base_url: None,
            media_bucket: DEFAULT_BUCKET.to_string(),
            bucket_file_size_limit_bytes: BUCKET_FILE_SIZE_LIMIT_BYTES,
            max_upload_size_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            default_upload_accept: DEFAULT_UPLOAD_ACCEPT.to_string(),
            upload_allowed_accepts: split_list(DEFAULT_UPLOAD_ALLOWED_ACCEPTS),
            upload_cache_control: DEFAULT_CACHE_CONTROL.to_string(),
            placeholder_image_path: PLACEHOLDER_IMAGE_PATH.to_string(),
            image_probe_timeout_secs: IMAGE_PROBE_TIMEOUT_SECS,
            image_probe_allow_private: false,
        }
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.media_bucket.contains('/') {
            return Err(anyhow::anyhow!("MEDIA_BUCKET must not contain '/'"));
        }

        if self.bucket_file_size_limit_bytes == 0 || self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!(
                "BUCKET_FILE_SIZE_LIMIT_MB and MAX_UPLOAD_SIZE_MB must be greater than zero"
            ));
        }

        if self.max_upload_size_bytes > self.bucket_file_size_limit_bytes {
            return Err(anyhow::anyhow!(
                "MAX_UPLOAD_SIZE_MB ({}) cannot exceed BUCKET_FILE_SIZE_LIMIT_MB ({})",
                self.max_upload_size_bytes / BYTES_PER_MB,
                self.bucket_file_size_limit_bytes / BYTES_PER_MB
            ));
        }

        if self.image_probe_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "IMAGE_PROBE_TIMEOUT_SECS must be greater than zero"
            ));
        }

        // Validate storage backend configuration
        match self.storage_backend {
            StorageBackend::Supabase => {
                match self.supabase_url.as_deref() {
                    None => {
                        return Err(anyhow::anyhow!(
                            "SUPABASE_URL must be set when using Supabase storage backend"
                        ));
                    }
                    Some(url) if url::Url::parse(url).is_err() => {
                        return Err(anyhow::anyhow!("SUPABASE_URL must be a valid URL"));
                    }
                    Some(_) => {}
                }
                if self.supabase_service_role_key.is_none() {
                    return Err(anyhow::anyhow!(
                        "SUPABASE_SERVICE_ROLE_KEY must be set when using Supabase storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
            StorageBackend::Memory => {}
        }

        Ok(())
    }
}
