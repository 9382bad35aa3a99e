//! Adapter configuration.
//!
//! Stored as TOML, e.g.:
//!
//! ```toml
//! enabled = true
//! web_sub_hub_base_url = "https://hub.example.com/hub"
//! connect_timeout_ms = 300
//! request_timeout_ms = 300
//! max_idle_connections_per_host = 20
//! ```
//!
//! `IDEVENT_WEBSUB_HUB_BASE_URL` overrides the base URL from the file.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable overriding `web_sub_hub_base_url`.
pub const BASE_URL_ENV: &str = "IDEVENT_WEBSUB_HUB_BASE_URL";

/// Errors from loading or validating the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("adapter is enabled but web_sub_hub_base_url is not set")]
    MissingBaseUrl,

    #[error("invalid web_sub_hub_base_url '{0}': expected an http(s) URL")]
    InvalidBaseUrl(String),
}

/// WebSub Hub adapter configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterConfiguration {
    /// Whether the adapter publishes at all.
    #[serde(default)]
    pub enabled: bool,

    /// Base URL of the hub, e.g. `https://hub.example.com/hub`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_sub_hub_base_url: Option<String>,

    #[serde(default = "default_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_max_idle_per_host")]
    pub max_idle_connections_per_host: usize,
}

fn default_timeout_ms() -> u64 {
    300
}

fn default_max_idle_per_host() -> usize {
    20
}

impl Default for AdapterConfiguration {
    fn default() -> Self {
        Self {
            enabled: false,
            web_sub_hub_base_url: None,
            connect_timeout_ms: default_timeout_ms(),
            request_timeout_ms: default_timeout_ms(),
            max_idle_connections_per_host: default_max_idle_per_host(),
        }
    }
}

impl AdapterConfiguration {
    /// Loads and validates the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?
            .with_base_url_override(std::env::var(BASE_URL_ENV).ok());
        config.validate()?;
        tracing::debug!(path = %path.display(), enabled = config.enabled, "adapter configuration loaded");
        Ok(config)
    }

    /// Parses TOML; the base URL is stored with surrounding whitespace removed.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.web_sub_hub_base_url = config
            .web_sub_hub_base_url
            .map(|url| url.trim().to_string());
        Ok(config)
    }

    /// Replaces the base URL when `value` is a non-blank string.
    pub fn with_base_url_override(mut self, value: Option<String>) -> Self {
        if let Some(url) = value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
        {
            self.web_sub_hub_base_url = Some(url);
        }
        self
    }

    /// Checks that an enabled adapter has a usable base URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.web_sub_hub_base_url.as_deref().map(str::trim) {
            None | Some("") if self.enabled => Err(ConfigError::MissingBaseUrl),
            Some(url)
                if !url.is_empty()
                    && !url.starts_with("http://")
                    && !url.starts_with("https://") =>
            {
                Err(ConfigError::InvalidBaseUrl(url.to_string()))
            }
            _ => Ok(()),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Source of the adapter configuration values the adapter reads lazily.
pub trait ConfigurationProvider: Send + Sync {
    /// Returns the configured hub base URL, if any.
    fn web_sub_hub_base_url(&self) -> Option<String>;
}

impl ConfigurationProvider for AdapterConfiguration {
    fn web_sub_hub_base_url(&self) -> Option<String> {
        self.web_sub_hub_base_url.clone()
    }
}
