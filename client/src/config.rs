//! Client configuration parsed from environment variables.

use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("config parse failed: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `PAWPEDIA_API_URL`: backend base URL, default `http://localhost:5000/api`
    /// - `PAWPEDIA_REQUEST_TIMEOUT_SECS`: default 10
    /// - `PAWPEDIA_CONNECT_TIMEOUT_SECS`: default 5
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the base URL is set but blank.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = match std::env::var("PAWPEDIA_API_URL") {
            Ok(raw) => normalize_api_url(&raw)?,
            Err(_) => DEFAULT_API_URL.to_owned(),
        };
        Ok(Self {
            api_url,
            request_timeout_secs: env_parse_u64("PAWPEDIA_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout_secs: env_parse_u64("PAWPEDIA_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        })
    }

    /// Replace the base URL, keeping the timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when `api_url` is blank.
    pub fn with_api_url(mut self, api_url: &str) -> Result<Self, ConfigError> {
        self.api_url = normalize_api_url(api_url)?;
        Ok(self)
    }
}

pub(crate) fn normalize_api_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::Parse("PAWPEDIA_API_URL must not be empty".to_owned()));
    }
    Ok(trimmed.to_owned())
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
