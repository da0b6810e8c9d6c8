//! Client configuration loaded from environment.

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const APP_DIR_NAME: &str = "bill_client";

/// Client configuration loaded from `.env` and environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Prefix for every endpoint path (e.g. `http://127.0.0.1:8000/api`).
    pub api_base_url: String,
    /// Default timeout applied to each request.
    pub request_timeout: Duration,
    /// Directory holding the persisted token entry.
    pub token_dir: PathBuf,
    /// Log level: `error`, `warn`, `info`, `debug`, `trace`.
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment. Call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let api_base_url = std::env::var("API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        reqwest::Url::parse(&api_base_url)
            .map_err(|_| ConfigLoadError::InvalidApiBaseUrl(api_base_url.clone()))?;

        let request_timeout = match std::env::var("REQUEST_TIMEOUT_SECS") {
            Ok(raw) => parse_timeout(&raw)?,
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let token_dir = std::env::var("TOKEN_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_token_dir());
        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            api_base_url,
            request_timeout,
            token_dir,
            log_level,
        })
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigLoadError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigLoadError::InvalidTimeout(raw.to_string())),
    }
}

fn default_token_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(format!(".{APP_DIR_NAME}")))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Invalid API_BASE_URL: {0}")]
    InvalidApiBaseUrl(String),
    #[error("Invalid REQUEST_TIMEOUT_SECS: {0}")]
    InvalidTimeout(String),
}
