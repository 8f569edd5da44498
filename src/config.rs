//! Client configuration parsed from environment variables.

use std::path::PathBuf;

use crate::error::ConfigError;
use crate::state::token_store::TOKEN_STORAGE_KEY;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub token_dir: PathBuf,
    pub timeouts: HttpTimeouts,
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `FLAPPER_BASE_URL`: default `http://127.0.0.1:3000`
    /// - `FLAPPER_TOKEN_DIR`: default `$XDG_CONFIG_HOME/flapper-news`,
    ///   then `$HOME/.config/flapper-news`, then the working directory
    /// - `FLAPPER_REQUEST_TIMEOUT_SECS`: default 120
    /// - `FLAPPER_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidBaseUrl` for a non-HTTP base URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an injectable variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidBaseUrl` for a non-HTTP base URL.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url = parse_base_url(var("FLAPPER_BASE_URL").as_deref().unwrap_or(DEFAULT_BASE_URL))?;
        let token_dir = var("FLAPPER_TOKEN_DIR").map_or_else(
            || default_token_dir(var("XDG_CONFIG_HOME"), var("HOME")),
            PathBuf::from,
        );
        let timeouts = HttpTimeouts {
            request_secs: parse_u64(var("FLAPPER_REQUEST_TIMEOUT_SECS"), DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_u64(var("FLAPPER_CONNECT_TIMEOUT_SECS"), DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { base_url, token_dir, timeouts })
    }

    /// Override the base URL (e.g. from a CLI flag).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidBaseUrl` for a non-HTTP base URL.
    pub fn with_base_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.base_url = parse_base_url(raw)?;
        Ok(self)
    }

    #[must_use]
    pub fn with_token_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.token_dir = dir.into();
        self
    }

    /// File backing the persisted token slot.
    #[must_use]
    pub fn token_path(&self) -> PathBuf {
        self.token_dir.join(TOKEN_STORAGE_KEY)
    }
}

fn parse_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_owned())
    } else {
        Err(ConfigError::InvalidBaseUrl(raw.to_owned()))
    }
}

fn parse_u64(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn default_token_dir(xdg_config_home: Option<String>, home: Option<String>) -> PathBuf {
    match (xdg_config_home, home) {
        (Some(xdg), _) => PathBuf::from(xdg).join("flapper-news"),
        (None, Some(home)) => PathBuf::from(home).join(".config").join("flapper-news"),
        (None, None) => PathBuf::from("."),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
