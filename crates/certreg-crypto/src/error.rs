//! # Cryptographic Error Types

use thiserror::Error;

/// Errors from key handling and signature verification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Ed25519 signature verification failed.
    #[error("Ed25519 verification failed: {0}")]
    VerificationFailed(String),

    /// Public key bytes do not encode a valid curve point, or hex is malformed.
    #[error("invalid Ed25519 public key: {0}")]
    InvalidPublicKey(String),

    /// Signature hex is malformed.
    #[error("invalid Ed25519 signature: {0}")]
    InvalidSignature(String),

    /// Private key seed is malformed.
    #[error("invalid Ed25519 seed: {0}")]
    InvalidSeed(String),
}
