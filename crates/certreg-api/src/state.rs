//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers via
//! the `State` extractor. The registry is the only store; it is constructed
//! once with a fixed admin and shared as `Arc<CertificateRegistry>`.

use std::sync::Arc;

use certreg_core::Identity;
use certreg_crypto::Ed25519PublicKey;
use certreg_registry::CertificateRegistry;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8080;

/// Server configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum AppConfigError {
    /// Neither admin variable is set.
    #[error("no admin configured: set CERTREG_ADMIN or CERTREG_ADMIN_PUBKEY")]
    MissingAdmin,
    /// A variable is set but cannot be parsed.
    #[error("invalid {var}: {reason}")]
    Invalid {
        /// Variable name.
        var: &'static str,
        /// Parse failure.
        reason: String,
    },
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// The registry admin.
    pub admin: Identity,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// - `PORT` (default 8080)
    /// - `CERTREG_ADMIN`: admin identity, `0x` + 40 hex
    /// - `CERTREG_ADMIN_PUBKEY`: admin Ed25519 public key hex, used when
    ///   `CERTREG_ADMIN` is unset
    pub fn from_env() -> Result<Self, AppConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self, AppConfigError> {
        let port = match get("PORT") {
            Some(raw) => raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                AppConfigError::Invalid {
                    var: "PORT",
                    reason: e.to_string(),
                }
            })?,
            None => DEFAULT_PORT,
        };

        let admin = if let Some(raw) = get("CERTREG_ADMIN") {
            Identity::parse(raw.trim()).map_err(|e| AppConfigError::Invalid {
                var: "CERTREG_ADMIN",
                reason: e.to_string(),
            })?
        } else if let Some(raw) = get("CERTREG_ADMIN_PUBKEY") {
            Ed25519PublicKey::from_hex(raw.trim())
                .map_err(|e| AppConfigError::Invalid {
                    var: "CERTREG_ADMIN_PUBKEY",
                    reason: e.to_string(),
                })?
                .identity()
        } else {
            return Err(AppConfigError::MissingAdmin);
        };

        Ok(Self { port, admin })
    }
}

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub registry: Arc<CertificateRegistry>,
}

impl AppState {
    /// State with a fresh registry on the system clock.
    pub fn new(config: AppConfig) -> Self {
        let registry = Arc::new(CertificateRegistry::with_system_clock(config.admin));
        Self { config, registry }
    }

    /// State around an existing registry.
    pub fn with_registry(config: AppConfig, registry: Arc<CertificateRegistry>) -> Self {
        Self { config, registry }
    }
}
