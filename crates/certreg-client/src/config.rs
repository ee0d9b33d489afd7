//! Registry client configuration.
//!
//! Points the HTTP transport at a `certreg-api` server. Defaults target a
//! local server; override via environment variables or explicit
//! construction.

use url::Url;

/// Default server address.
pub const DEFAULT_URL: &str = "http://127.0.0.1:8080";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for reaching a registry server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the registry API.
    pub base_url: Url,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `CERTREG_URL` (default: `http://127.0.0.1:8080`)
    /// - `CERTREG_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: env_url("CERTREG_URL", DEFAULT_URL)?,
            timeout_secs: env_timeout("CERTREG_TIMEOUT_SECS")?,
        })
    }

    /// Configuration for an explicit URL with the default timeout.
    pub fn for_url(raw: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_url("url", raw)?,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }

    /// Override the timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

fn parse_url(source: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(source.to_string(), e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidUrl(
            source.to_string(),
            format!("unsupported scheme '{other}'"),
        )),
    }
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    parse_url(var, &raw)
}

fn env_timeout(var: &str) -> Result<u64, ConfigError> {
    match std::env::var(var) {
        Err(_) => Ok(DEFAULT_TIMEOUT_SECS),
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(secs),
            _ => Err(ConfigError::InvalidTimeout(var.to_string(), raw)),
        },
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A URL did not parse or uses a scheme other than http(s).
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    /// A timeout was not a positive integer.
    #[error("invalid timeout for {0}: {1:?} (expected a positive number of seconds)")]
    InvalidTimeout(String, String),
}
