//! Configuration validation
//!
//! Validates critical configuration values at startup to catch misconfigurations early.

use anyhow::Result;
use folio_core::{Config, StorageBackend};

/// Validate critical configuration values
///
/// Runs the field checks in [`Config::validate`] and adds the rules that only
/// matter for a running server.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    if config.request_timeout_secs() == 0 {
        return Err(anyhow::anyhow!("REQUEST_TIMEOUT_SECS must be greater than 0"));
    }

    if config.is_production() {
        if config.storage_backend() == StorageBackend::Memory {
            return Err(anyhow::anyhow!(
                "STORAGE_BACKEND=memory loses every upload on restart and is not allowed in production"
            ));
        }

        if config.image_probe_allow_private() {
            tracing::warn!(
                "IMAGE_PROBE_ALLOW_PRIVATE is enabled in production - image checks can reach internal hosts"
            );
        }
    }

    Ok(())
}
