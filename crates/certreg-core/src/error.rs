//! # Error Hierarchy
//!
//! Structured error types for the foundational layer, built with `thiserror`.
//!
//! Each variant carries the offending input so that operators can diagnose a
//! rejected request without guesswork.

use thiserror::Error;

/// Errors during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations; use string or integer: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed during canonicalization.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Validation errors for domain primitive newtypes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Certificate identifier failed structural validation.
    #[error("malformed certificate id: \"{input}\" ({reason})")]
    MalformedId {
        /// The string that failed to parse.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Identity string is not a 20-byte hex address.
    #[error("invalid identity: \"{0}\" (expected 0x followed by 40 hex characters)")]
    InvalidIdentity(String),

    /// Timestamp is not representable or not valid UTC ISO 8601.
    #[error("invalid timestamp: \"{value}\" ({reason})")]
    InvalidTimestamp {
        /// The value that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}
