use std::path::Path;

use anyhow::Context;

use crate::{
    fetch::retry::RetryPolicy,
    foundation::error::{GrabError, GrabResult},
};

/// Default main-site origin (canvas metadata, raw chunks, history time lists).
pub const DEFAULT_API_URL: &str = "https://pixelplanet.fun";
/// Default origin of the daily backup storage.
pub const DEFAULT_STORAGE_URL: &str = "https://storage.pixelplanet.fun";

/// Run configuration shared by area and history downloads.
///
/// Every field has a default, so a JSON config file only needs the keys it overrides.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GrabConfig {
    pub api_url: String,
    pub storage_url: String,
    pub user_agent: String,
    /// Worker threads per batch; bounds the number of in-flight tile requests.
    pub threads: Option<usize>,
    pub request_timeout_secs: u64,
    pub tile_retry: RetryPolicy,
    pub metadata_retry: RetryPolicy,
    /// Keep every n-th time slice of a history day (1 keeps all).
    pub frame_skip: usize,
}

impl Default for GrabConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            storage_url: DEFAULT_STORAGE_URL.to_string(),
            user_agent: format!("pixelgrab {}", env!("CARGO_PKG_VERSION")),
            threads: None,
            request_timeout_secs: 30,
            tile_retry: RetryPolicy::tiles(),
            metadata_retry: RetryPolicy::metadata(),
            frame_skip: 1,
        }
    }
}

impl GrabConfig {
    /// Load a JSON config file; absent keys keep their defaults.
    pub fn from_path(path: &Path) -> GrabResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_str(&text)
            .map_err(|e| GrabError::serde(format!("parse config '{}': {e}", path.display())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> GrabResult<()> {
        if let Some(n) = self.threads
            && n == 0
        {
            return Err(GrabError::validation(
                "config 'threads' must be >= 1 when set",
            ));
        }
        if self.frame_skip == 0 {
            return Err(GrabError::validation("config 'frame_skip' must be >= 1"));
        }
        if self.api_url.is_empty() || self.storage_url.is_empty() {
            return Err(GrabError::validation(
                "config 'api_url' and 'storage_url' must be non-empty",
            ));
        }
        self.tile_retry.validate()?;
        self.metadata_retry.validate()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
