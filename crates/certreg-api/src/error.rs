//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Registry rejections keep their own code and carry `details` from which a
//! remote client rebuilds the exact [`RegistryError`] variant. Internal
//! error messages are logged and never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use certreg_registry::RegistryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g. "NOT_FOUND", "ALREADY_REVOKED").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Fields of the registry error, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// The registry rejected the operation.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A non-certificate resource (e.g. a transaction record) does not exist (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// The request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status and machine-readable code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Registry(err) => {
                let status = match err {
                    RegistryError::Unauthorized { .. } => StatusCode::FORBIDDEN,
                    RegistryError::InvalidInput { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
                    RegistryError::MalformedId { .. } => StatusCode::BAD_REQUEST,
                    RegistryError::AlreadyRevoked(_) => StatusCode::CONFLICT,
                    RegistryError::InvalidSignature(_) => StatusCode::UNAUTHORIZED,
                    RegistryError::ChainIntegrity { .. } | RegistryError::Canonicalization(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, err.code())
            }
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    fn is_hidden(&self) -> bool {
        matches!(
            self,
            Self::Internal(_) | Self::Registry(RegistryError::Canonicalization(_))
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = if self.is_hidden() {
            tracing::error!(error = %self, "internal server error");
            "An internal error occurred".to_string()
        } else {
            if let Self::Registry(RegistryError::ChainIntegrity { .. }) = &self {
                tracing::error!(error = %self, "change log integrity failure");
            }
            self.to_string()
        };

        let details = match &self {
            Self::Registry(err) => err.details(),
            _ => None,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };
        (status, Json(body)).into_response()
    }
}
