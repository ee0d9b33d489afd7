//! # Signed Transactions
//!
//! Mutating requests reach the registry as a [`Transaction`] signed with the
//! caller's Ed25519 key. The signature covers the canonical bytes of the
//! whole transaction body, nonce and signer key included, so a captured
//! transaction cannot be altered or re-attributed.
//!
//! The [`TxId`] is the SHA-256 of the same canonical body. Submitting one
//! signed transaction twice yields one commit: the registry recognises the
//! id and returns the original change record.

use certreg_core::{sha256_digest, CanonicalBytes, CertificateId, ContentDigest, Identity};
use certreg_crypto::{verify_with_public_key, Ed25519PublicKey, Ed25519Signature};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::certificate::CertificateFields;
use crate::error::RegistryError;

/// A mutating registry operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Record a new certificate.
    Issue(CertificateFields),
    /// Mark an existing certificate invalid.
    Revoke {
        /// Certificate to revoke.
        id: CertificateId,
    },
}

impl Operation {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Issue(_) => "issue",
            Self::Revoke { .. } => "revoke",
        }
    }
}

/// The signed body of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// What to do.
    pub operation: Operation,
    /// Distinguishes otherwise identical requests.
    pub nonce: Uuid,
    /// Key that signs this transaction.
    pub signer: Ed25519PublicKey,
}

impl Transaction {
    /// A transaction with a fresh random nonce.
    pub fn new(operation: Operation, signer: Ed25519PublicKey) -> Self {
        Self {
            operation,
            nonce: Uuid::new_v4(),
            signer,
        }
    }

    /// The bytes a signer signs.
    pub fn signing_bytes(&self) -> Result<CanonicalBytes, RegistryError> {
        Ok(CanonicalBytes::new(self)?)
    }

    /// Content-derived transaction id.
    pub fn tx_id(&self) -> Result<TxId, RegistryError> {
        Ok(TxId(sha256_digest(&self.signing_bytes()?)))
    }

    /// Identity of the signer.
    pub fn caller(&self) -> Identity {
        self.signer.identity()
    }
}

/// A transaction plus the signer's signature over it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    /// The signed body.
    pub transaction: Transaction,
    /// Ed25519 signature over `transaction.signing_bytes()`.
    pub signature: Ed25519Signature,
}

impl SignedTransaction {
    /// Pair a body with its signature. Nothing is checked here.
    pub fn new(transaction: Transaction, signature: Ed25519Signature) -> Self {
        Self {
            transaction,
            signature,
        }
    }

    /// Check the signature against the embedded signer key.
    pub fn verify_signature(&self) -> Result<(), RegistryError> {
        let bytes = self.transaction.signing_bytes()?;
        verify_with_public_key(&bytes, &self.signature, &self.transaction.signer)?;
        Ok(())
    }

    /// Transaction id of the body.
    pub fn tx_id(&self) -> Result<TxId, RegistryError> {
        self.transaction.tx_id()
    }
}

/// Identifier of a transaction: SHA-256 of its canonical body.
///
/// Renders as `0x` followed by 64 hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxId(ContentDigest);

impl TxId {
    /// Wrap a digest.
    pub fn from_digest(digest: ContentDigest) -> Self {
        Self(digest)
    }

    /// The underlying digest.
    pub fn digest(&self) -> &ContentDigest {
        &self.0
    }

    /// Parse `0x` + 64 hex characters (prefix optional), as for certificate ids.
    pub fn parse(input: &str) -> Result<Self, RegistryError> {
        ContentDigest::parse_prefixed(input)
            .map(Self)
            .map_err(|reason| RegistryError::MalformedId {
                input: input.to_string(),
                reason: format!("transaction id: {reason}"),
            })
    }
}

impl std::fmt::Display for TxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", self.0.to_hex())
    }
}

impl std::str::FromStr for TxId {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for TxId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TxId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
