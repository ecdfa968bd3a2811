//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the API base URL, an optional bearer token, and per-resource
//! store settings (cache timeout, request timeout, fallback data).
//!
//! Configuration is stored at `~/.config/fleetcache/config.json`.
//! `FLEETCACHE_API_URL` and `FLEETCACHE_TOKEN` override the file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::client::REQUEST_TIMEOUT_SECS;

/// Application name used for config directory paths
const APP_NAME: &str = "fleetcache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding `api_base_url`
pub const ENV_API_URL: &str = "FLEETCACHE_API_URL";

/// Environment variable overriding `token`
pub const ENV_TOKEN: &str = "FLEETCACHE_TOKEN";

const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";

/// Keep cached items for 5 minutes before the next first-page load refetches.
const DEFAULT_CACHE_TIMEOUT_SECS: u64 = 5 * 60;

const DEFAULT_FALLBACK_SEED: u64 = 42;

const DEFAULT_FALLBACK_LEN: usize = 12;

/// Settings for one `ResourceStore`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub cache_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub fallback_enabled: bool,
    pub fallback_seed: u64,
    pub fallback_len: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            cache_timeout_secs: DEFAULT_CACHE_TIMEOUT_SECS,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            fallback_enabled: true,
            fallback_seed: DEFAULT_FALLBACK_SEED,
            fallback_len: DEFAULT_FALLBACK_LEN,
        }
    }
}

impl StoreConfig {
    pub fn cache_timeout(&self) -> Duration {
        Duration::from_secs(self.cache_timeout_secs)
    }

    /// Never zero; a zero timeout would fail every request.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Number of fallback records, at least one.
    pub fn fallback_len(&self) -> usize {
        self.fallback_len.max(1)
    }

    /// Raise zero request timeout and fallback length to one.
    fn normalize(&mut self, resource: &str) {
        if self.request_timeout_secs == 0 {
            warn!(resource, "request_timeout_secs is 0, using 1");
            self.request_timeout_secs = 1;
        }
        if self.fallback_len == 0 {
            warn!(resource, "fallback_len is 0, using 1");
            self.fallback_len = 1;
        }
    }

    pub fn with_cache_timeout(mut self, timeout: Duration) -> Self {
        self.cache_timeout_secs = timeout.as_secs();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = timeout.as_secs();
        self
    }

    pub fn without_fallback(mut self) -> Self {
        self.fallback_enabled = false;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Per-resource overrides keyed by collection path (e.g. `notifications`)
    #[serde(default)]
    pub stores: HashMap<String, StoreConfig>,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    REQUEST_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            token: None,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            stores: HashMap::new(),
        }
    }
}

impl Config {
    /// Load from the default location, then apply environment overrides
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = Self::load_from(&path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.normalize();
        Ok(config)
    }

    fn normalize(&mut self) {
        if self.request_timeout_secs == 0 {
            warn!("request_timeout_secs is 0, using 1");
            self.request_timeout_secs = 1;
        }
        for (resource, store) in &mut self.stores {
            store.normalize(resource);
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(
            std::env::var(ENV_API_URL).ok(),
            std::env::var(ENV_TOKEN).ok(),
        );
    }

    fn apply_overrides(&mut self, api_url: Option<String>, token: Option<String>) {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url;
        }
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.token = Some(token);
        }
    }

    /// Store settings for `resource`, or the defaults
    pub fn store(&self, resource: &str) -> StoreConfig {
        self.stores.get(resource).cloned().unwrap_or_default()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
