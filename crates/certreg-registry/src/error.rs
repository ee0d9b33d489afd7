//! # Registry Errors
//!
//! Every rejection the registry can produce. Authorization and validation
//! failures are deterministic: retrying the same request yields the same
//! error, so callers never retry them.

use certreg_core::{CertificateId, Identity};
use serde_json::{json, Value};
use thiserror::Error;

use crate::role::Role;

/// Errors from registry operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The caller does not hold the role the operation requires.
    #[error("caller {caller} is not authorized: {required} role required")]
    Unauthorized {
        /// The identity that attempted the operation.
        caller: Identity,
        /// The role the operation requires.
        required: Role,
    },

    /// A certificate field is empty or too long.
    #[error("invalid input for field '{field}': {reason}")]
    InvalidInput {
        /// The offending field.
        field: String,
        /// Why it was rejected.
        reason: String,
    },

    /// No certificate with this id was ever issued.
    #[error("certificate {0} not found")]
    NotFound(CertificateId),

    /// The presented id is not a structurally valid certificate id.
    #[error("malformed certificate id \"{input}\": {reason}")]
    MalformedId {
        /// The raw input.
        input: String,
        /// Why it failed to parse.
        reason: String,
    },

    /// The certificate has already been revoked.
    #[error("certificate {0} is already revoked")]
    AlreadyRevoked(CertificateId),

    /// A transaction's signature does not verify against its signer key.
    #[error("invalid transaction signature: {0}")]
    InvalidSignature(String),

    /// The change log failed integrity verification.
    #[error("change log integrity violation at record #{sequence}: {reason}")]
    ChainIntegrity {
        /// The first record that failed verification.
        sequence: u64,
        /// What did not match.
        reason: String,
    },

    /// A value could not be canonicalized for hashing or signing.
    #[error("canonicalization failed: {0}")]
    Canonicalization(String),
}

// -- wire form ------------------------------------------------------------------
//
// Errors cross the HTTP boundary as `{code, message, details}`. `code()` and
// `details()` produce that form; `from_wire()` inverts it so a remote client
// sees the same variant the registry raised.

impl RegistryError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "UNAUTHORIZED",
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::MalformedId { .. } => "MALFORMED_ID",
            Self::AlreadyRevoked(_) => "ALREADY_REVOKED",
            Self::InvalidSignature(_) => "INVALID_SIGNATURE",
            Self::ChainIntegrity { .. } => "CHAIN_INTEGRITY",
            Self::Canonicalization(_) => "INTERNAL_ERROR",
        }
    }

    /// Structured fields needed to rebuild the variant.
    pub fn details(&self) -> Option<Value> {
        match self {
            Self::Unauthorized { caller, required } => {
                Some(json!({ "caller": caller, "required": required }))
            }
            Self::InvalidInput { field, reason } => Some(json!({ "field": field, "reason": reason })),
            Self::NotFound(id) | Self::AlreadyRevoked(id) => Some(json!({ "id": id })),
            Self::MalformedId { input, reason } => Some(json!({ "input": input, "reason": reason })),
            Self::InvalidSignature(reason) => Some(json!({ "reason": reason })),
            Self::ChainIntegrity { sequence, reason } => {
                Some(json!({ "sequence": sequence, "reason": reason }))
            }
            Self::Canonicalization(_) => None,
        }
    }

    /// Rebuild a registry error from its wire form. `None` for codes that
    /// are not registry errors or details that do not parse.
    pub fn from_wire(code: &str, details: Option<&Value>) -> Option<Self> {
        let d = details?;
        let text = |key: &str| d.get(key).and_then(Value::as_str).map(str::to_string);
        let parsed = |key: &str| -> Option<Value> { d.get(key).cloned() };
        match code {
            "UNAUTHORIZED" => Some(Self::Unauthorized {
                caller: serde_json::from_value(parsed("caller")?).ok()?,
                required: serde_json::from_value(parsed("required")?).ok()?,
            }),
            "INVALID_INPUT" => Some(Self::InvalidInput {
                field: text("field")?,
                reason: text("reason")?,
            }),
            "NOT_FOUND" => Some(Self::NotFound(serde_json::from_value(parsed("id")?).ok()?)),
            "ALREADY_REVOKED" => Some(Self::AlreadyRevoked(
                serde_json::from_value(parsed("id")?).ok()?,
            )),
            "MALFORMED_ID" => Some(Self::MalformedId {
                input: text("input")?,
                reason: text("reason")?,
            }),
            "INVALID_SIGNATURE" => Some(Self::InvalidSignature(text("reason")?)),
            "CHAIN_INTEGRITY" => Some(Self::ChainIntegrity {
                sequence: d.get("sequence").and_then(Value::as_u64)?,
                reason: text("reason")?,
            }),
            _ => None,
        }
    }
}

impl From<certreg_core::ValidationError> for RegistryError {
    fn from(err: certreg_core::ValidationError) -> Self {
        match err {
            certreg_core::ValidationError::MalformedId { input, reason } => {
                Self::MalformedId { input, reason }
            }
            other => Self::InvalidInput {
                field: "input".to_string(),
                reason: other.to_string(),
            },
        }
    }
}

impl From<certreg_core::CanonicalizationError> for RegistryError {
    fn from(err: certreg_core::CanonicalizationError) -> Self {
        Self::Canonicalization(err.to_string())
    }
}

impl From<certreg_crypto::CryptoError> for RegistryError {
    fn from(err: certreg_crypto::CryptoError) -> Self {
        Self::InvalidSignature(err.to_string())
    }
}
