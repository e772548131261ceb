//! Live check that a URL serves an image.
//!
//! Advisory only: a `false` blocks a profile form from saving, but a `true` says
//! nothing about what the URL will serve later. Rendering goes through
//! `folio_core::get_safe_image_url` regardless.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use folio_core::Config;
use reqwest::redirect::Policy;
use url::Url;

use crate::ssrf;

const MAX_REDIRECTS: usize = 5;

/// Status and content type returned by a HEAD request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    pub content_type: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Probe target blocked: {0}")]
    Blocked(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Probe configuration error: {0}")]
    Config(String),
}

/// Issues a single HEAD request.
#[async_trait]
pub trait HeadProbe: Send + Sync {
    async fn head(&self, url: &str) -> Result<ProbeResponse, ProbeError>;
}

/// [`HeadProbe`] over reqwest, guarded against private targets.
#[derive(Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    allow_private: bool,
}

impl HttpProbe {
    pub fn new(timeout: Duration, allow_private: bool) -> Result<Self, ProbeError> {
        let redirect = if allow_private {
            Policy::limited(MAX_REDIRECTS)
        } else {
            Policy::custom(|attempt| {
                if attempt.previous().len() >= MAX_REDIRECTS {
                    attempt.error("too many redirects")
                } else if ssrf::is_blocked_host(attempt.url()) {
                    attempt.stop()
                } else {
                    attempt.follow()
                }
            })
        };

        let mut builder = reqwest::Client::builder().timeout(timeout).redirect(redirect);
        if !allow_private {
            builder = builder.dns_resolver(Arc::new(ssrf::PublicOnlyResolver));
        }
        let client = builder
            .build()
            .map_err(|e| ProbeError::Config(e.to_string()))?;

        Ok(Self {
            client,
            allow_private,
        })
    }
}

#[async_trait]
impl HeadProbe for HttpProbe {
    async fn head(&self, url: &str) -> Result<ProbeResponse, ProbeError> {
        let parsed = Url::parse(url).map_err(|e| ProbeError::InvalidUrl(e.to_string()))?;
        ssrf::check_probe_target(&parsed, self.allow_private)
            .await
            .map_err(ProbeError::Blocked)?;

        let response = self
            .client
            .head(parsed)
            .send()
            .await
            .map_err(|e| ProbeError::Request(e.to_string()))?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        Ok(ProbeResponse {
            status: response.status().as_u16(),
            content_type,
        })
    }
}

/// Decides whether a reference points at a live image.
#[derive(Clone)]
pub struct ImageValidator {
    probe: Arc<dyn HeadProbe>,
}

impl ImageValidator {
    pub fn new(probe: Arc<dyn HeadProbe>) -> Self {
        Self { probe }
    }

    /// Validator backed by [`HttpProbe`] with the configured timeout and SSRF policy.
    pub fn from_config(config: &Config) -> Result<Self, ProbeError> {
        let probe = HttpProbe::new(
            Duration::from_secs(config.image_probe_timeout_secs()),
            config.image_probe_allow_private(),
        )?;
        Ok(Self::new(Arc::new(probe)))
    }

    /// `true` only if one HEAD request succeeds with a 2xx status and an `image/*`
    /// content type. Every failure reads as `false`; nothing is retried.
    #[tracing::instrument(skip(self), fields(operation = "image_probe"))]
    pub async fn is_valid_image_url(&self, reference: &str) -> bool {
        if reference.is_empty() {
            return false;
        }

        let start = std::time::Instant::now();
        match self.probe.head(reference).await {
            Ok(response) => {
                let is_image = response
                    .content_type
                    .as_deref()
                    .map(|ct| ct.trim().to_ascii_lowercase().starts_with("image/"))
                    .unwrap_or(false);
                let valid = (200..300).contains(&response.status) && is_image;

                tracing::debug!(
                    status = response.status,
                    content_type = ?response.content_type,
                    valid,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Image probe completed"
                );
                valid
            }
            Err(e) => {
                tracing::debug!(
                    error = %e,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Image probe failed"
                );
                false
            }
        }
    }
}
