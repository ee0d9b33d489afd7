//! Client error types.
//!
//! [`ClientError`] keeps every registry rejection as its original
//! [`RegistryError`] variant, so a caller can tell "not found" from
//! "malformed id" from "revoked" without string matching. Each kind has its
//! own user-facing [`notice`](ClientError::notice).

use certreg_registry::{RegistryError, TxId};

use crate::config::ConfigError;
use crate::pending::PendingStoreError;
use crate::session::SessionError;

/// Failures below the registry: the request may or may not have arrived.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection or timeout failure after all retries.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        /// Method and path.
        endpoint: String,
        /// Underlying reqwest error.
        source: reqwest::Error,
    },
    /// Non-2xx status whose body is not a registry error.
    #[error("registry {endpoint} returned {status}: {body}")]
    Api {
        /// Method and path.
        endpoint: String,
        /// HTTP status.
        status: u16,
        /// Raw response body.
        body: String,
    },
    /// A 2xx response whose body did not decode.
    #[error("failed to decode response from {endpoint}: {reason}")]
    Deserialization {
        /// Method and path.
        endpoint: String,
        /// Decoder message.
        reason: String,
    },
}

/// Errors surfaced by [`RegistryClient`](crate::RegistryClient).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The registry rejected the request.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Identity session failure.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// An issue transaction committed but its record has no
    /// `CertificateIssued` event.
    #[error("no certificate id in change record for transaction {tx_id}")]
    IdExtractionFailed {
        /// The committed transaction.
        tx_id: TxId,
    },

    /// Transport failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Configuration failure.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The pending-request file could not be read or written. A request
    /// that fails this way before submission was never sent.
    #[error(transparent)]
    Pending(#[from] PendingStoreError),
}

impl ClientError {
    /// Whether this outcome is final for the request that produced it.
    ///
    /// Registry rejections are deterministic. A transport failure or a 5xx
    /// leaves the outcome unknown: the transaction may have committed.
    pub fn is_definitive(&self) -> bool {
        match self {
            Self::Registry(RegistryError::Canonicalization(_)) => false,
            Self::Registry(_) | Self::Session(_) | Self::IdExtractionFailed { .. } => true,
            Self::Config(_) | Self::Pending(_) => true,
            Self::Transport(TransportError::Api { status, .. }) => *status < 500,
            Self::Transport(_) => false,
        }
    }

    /// A one-line message for the person at the keyboard.
    pub fn notice(&self) -> String {
        match self {
            Self::Registry(err) => match err {
                RegistryError::Unauthorized { caller, .. } => format!(
                    "Not authorized: {caller} is not the registry admin. Only the admin can issue or revoke certificates."
                ),
                RegistryError::InvalidInput { field, reason } => {
                    format!("Invalid input: {field} {reason}.")
                }
                RegistryError::NotFound(id) => {
                    format!("Certificate not found: no certificate has id {id}.")
                }
                RegistryError::MalformedId { input, .. } => {
                    format!("Malformed certificate id: {input:?} is not 0x followed by 64 hex characters.")
                }
                RegistryError::AlreadyRevoked(id) => {
                    format!("Already revoked: certificate {id} was revoked earlier.")
                }
                RegistryError::InvalidSignature(_) => {
                    "Signature rejected: the registry could not verify the transaction signature.".to_string()
                }
                RegistryError::ChainIntegrity { sequence, .. } => format!(
                    "Registry integrity failure: the change log is inconsistent at record #{sequence}."
                ),
                RegistryError::Canonicalization(_) => {
                    "Internal error: the request could not be encoded.".to_string()
                }
            },
            Self::Session(err) => match err {
                SessionError::NoSigningAgent => {
                    "No signing agent: configure a key (for example with --key) before connecting.".to_string()
                }
                SessionError::UserRejected => {
                    "Request rejected: the signing agent declined.".to_string()
                }
                SessionError::NotConnected => {
                    "Not connected: connect an identity before submitting transactions.".to_string()
                }
                SessionError::KeyFile { path, .. } => {
                    format!("Key file unusable: {path} could not be loaded.")
                }
            },
            Self::IdExtractionFailed { tx_id } => format!(
                "Issued, but the certificate id could not be read from the result (transaction {tx_id}). Use recover to look it up."
            ),
            Self::Transport(TransportError::Api { status: 404, .. }) => {
                "Registry endpoint not found: check the registry URL.".to_string()
            }
            Self::Transport(_) => {
                "Registry unreachable: the request may have been applied. Repeating the same request resubmits the recorded transaction and cannot create a duplicate.".to_string()
            }
            Self::Config(err) => format!("Configuration error: {err}."),
            Self::Pending(err) => format!("Pending-request file unusable: {err}. Nothing was submitted."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certreg_core::{CertificateId, Identity};
    use certreg_registry::Role;
    use std::collections::HashSet;

    #[test]
    fn notices_are_distinct_per_kind() {
        let id = CertificateId::from_bytes([1; 32]);
        let errors: Vec<ClientError> = vec![
            RegistryError::Unauthorized {
                caller: Identity::from_bytes([2; 20]),
                required: Role::Admin,
            }
            .into(),
            RegistryError::InvalidInput {
                field: "course".into(),
                reason: "must not be empty".into(),
            }
            .into(),
            RegistryError::NotFound(id).into(),
            RegistryError::MalformedId {
                input: "0x1".into(),
                reason: "short".into(),
            }
            .into(),
            RegistryError::AlreadyRevoked(id).into(),
            RegistryError::InvalidSignature("bad".into()).into(),
            SessionError::NoSigningAgent.into(),
            SessionError::UserRejected.into(),
            SessionError::NotConnected.into(),
            TransportError::Api {
                endpoint: "GET /v1/admin".into(),
                status: 502,
                body: String::new(),
            }
            .into(),
            TransportError::Api {
                endpoint: "GET /v1/admin".into(),
                status: 404,
                body: "<html>no such route</html>".into(),
            }
            .into(),
            PendingStoreError::Corrupt {
                path: "admin.pending.json".into(),
                reason: "eof".into(),
            }
            .into(),
        ];
        let notices: HashSet<String> = errors.iter().map(ClientError::notice).collect();
        assert_eq!(notices.len(), errors.len());
        assert!(notices.iter().all(|n| !n.is_empty()));
    }

    #[test]
    fn not_found_notice_never_says_invalid() {
        let err: ClientError = RegistryError::NotFound(CertificateId::from_bytes([1; 32])).into();
        assert!(!err.notice().to_lowercase().contains("invalid"));
    }

    #[test]
    fn definitive_classification() {
        let rejected: ClientError = RegistryError::AlreadyRevoked(CertificateId::from_bytes([1; 32])).into();
        assert!(rejected.is_definitive());
        let unavailable: ClientError = TransportError::Api {
            endpoint: "POST /v1/transactions".into(),
            status: 503,
            body: String::new(),
        }
        .into();
        assert!(!unavailable.is_definitive());
        let undecodable: ClientError = TransportError::Deserialization {
            endpoint: "POST /v1/transactions".into(),
            reason: "eof".into(),
        }
        .into();
        assert!(!undecodable.is_definitive());
    }
}
