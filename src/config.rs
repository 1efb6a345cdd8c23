//! Client configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honoured for local use.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Network timeout applied to every request unless overridden.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Login entry point of the dashboard.
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Where the session tokens are persisted by default.
pub const DEFAULT_TOKEN_FILE: &str = ".admin-console/session.json";

/// Client configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the admin backend, without trailing slash
    pub api_url: String,
    /// Per-request network timeout
    pub request_timeout: Duration,
    /// File holding the persisted session tokens
    pub token_file: PathBuf,
    /// Path the client navigates to when the session cannot be recovered
    pub login_path: String,
    /// Honour HTTP(S)_PROXY from the environment
    pub system_proxy: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let api_url = env::var("ADMIN_API_URL").map_err(|_| ConfigError::Missing("ADMIN_API_URL"))?;
        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                name: "ADMIN_API_URL",
                reason: format!("expected an http(s) URL, got {:?}", api_url),
            });
        }

        let timeout_secs = match env::var("ADMIN_API_TIMEOUT_SECS") {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                name: "ADMIN_API_TIMEOUT_SECS",
                reason: e.to_string(),
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_url: api_url.trim().trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(timeout_secs),
            token_file: env::var("ADMIN_TOKEN_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_TOKEN_FILE)),
            login_path: env::var("ADMIN_LOGIN_PATH")
                .unwrap_or_else(|_| DEFAULT_LOGIN_PATH.to_string()),
            system_proxy: env::var("ADMIN_API_SYSTEM_PROXY")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true),
        })
    }

    /// Config pointing at a local backend, for tests.
    pub fn test_default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8080".to_string(),
            request_timeout: Duration::from_secs(5),
            token_file: env::temp_dir().join("admin-console-test-session.json"),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            system_proxy: false,
        }
    }

    /// Same as [`Config::test_default`] with a different backend URL.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}
