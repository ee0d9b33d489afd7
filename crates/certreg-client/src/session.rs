//! # Identity Session
//!
//! Resolves which identity the caller speaks for. The session asks an
//! ambient [`SigningAgent`] for an account, remembers the answer, and routes
//! signing requests to the same agent. It never makes authorization
//! decisions; the registry does that.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use certreg_core::{CanonicalBytes, Identity};
use certreg_crypto::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
use parking_lot::RwLock;
use tracing::info;

/// Session and signing-agent failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// No signing agent is configured.
    #[error("no signing agent is configured")]
    NoSigningAgent,
    /// The agent declined the account or signing request.
    #[error("the signing agent rejected the request")]
    UserRejected,
    /// An operation needs an identity but `connect()` has not succeeded.
    #[error("no identity is connected")]
    NotConnected,
    /// A key file could not be read or parsed.
    #[error("cannot load key file {path}: {reason}")]
    KeyFile {
        /// Path that was read.
        path: String,
        /// What went wrong.
        reason: String,
    },
}

/// Something that holds a key and answers account and signing requests.
#[async_trait]
pub trait SigningAgent: Send + Sync {
    /// The public key of the account the agent offers.
    async fn request_account(&self) -> Result<Ed25519PublicKey, SessionError>;

    /// Sign canonical bytes with the account key.
    async fn sign(&self, payload: &CanonicalBytes) -> Result<Ed25519Signature, SessionError>;
}

/// A signing agent backed by an in-memory Ed25519 key pair.
#[derive(Debug)]
pub struct KeyPairAgent {
    key: Ed25519KeyPair,
}

impl KeyPairAgent {
    /// Wrap a key pair.
    pub fn new(key: Ed25519KeyPair) -> Self {
        Self { key }
    }

    /// Load a hex seed written by `certreg keygen`.
    pub fn from_key_file(path: &Path) -> Result<Self, SessionError> {
        let key_file_error = |reason: String| SessionError::KeyFile {
            path: path.display().to_string(),
            reason,
        };
        let text = zeroize::Zeroizing::new(
            std::fs::read_to_string(path).map_err(|e| key_file_error(e.to_string()))?,
        );
        let key = Ed25519KeyPair::from_seed_hex(&text).map_err(|e| key_file_error(e.to_string()))?;
        Ok(Self { key })
    }
}

#[async_trait]
impl SigningAgent for KeyPairAgent {
    async fn request_account(&self) -> Result<Ed25519PublicKey, SessionError> {
        Ok(self.key.public_key())
    }

    async fn sign(&self, payload: &CanonicalBytes) -> Result<Ed25519Signature, SessionError> {
        Ok(self.key.sign(payload))
    }
}

/// The caller's connection to a signing agent.
pub struct IdentitySession {
    agent: Option<Arc<dyn SigningAgent>>,
    account: RwLock<Option<Ed25519PublicKey>>,
}

impl std::fmt::Debug for IdentitySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentitySession")
            .field("has_agent", &self.agent.is_some())
            .field("identity", &self.current_identity())
            .finish()
    }
}

impl IdentitySession {
    /// A session using `agent`.
    pub fn new(agent: Arc<dyn SigningAgent>) -> Self {
        Self {
            agent: Some(agent),
            account: RwLock::new(None),
        }
    }

    /// A session with no agent. `connect()` fails with `NoSigningAgent`.
    pub fn without_agent() -> Self {
        Self {
            agent: None,
            account: RwLock::new(None),
        }
    }

    /// Ask the agent for its account and remember it.
    ///
    /// Calling again re-asks the agent, so an account switch in the agent
    /// is picked up; otherwise the same identity comes back.
    pub async fn connect(&self) -> Result<Identity, SessionError> {
        let agent = self.agent.as_ref().ok_or(SessionError::NoSigningAgent)?;
        let key = agent.request_account().await?;
        let identity = key.identity();
        let previous = self.account.write().replace(key);
        if previous.map(|k| k.identity()) != Some(identity) {
            info!(identity = %identity, "identity connected");
        }
        Ok(identity)
    }

    /// The last identity `connect()` resolved.
    pub fn current_identity(&self) -> Option<Identity> {
        self.account.read().map(|k| k.identity())
    }

    /// Public key of the connected account.
    pub fn signer(&self) -> Result<Ed25519PublicKey, SessionError> {
        self.account.read().ok_or(SessionError::NotConnected)
    }

    /// Have the agent sign `payload`.
    pub async fn sign(&self, payload: &CanonicalBytes) -> Result<Ed25519Signature, SessionError> {
        let agent = self.agent.as_ref().ok_or(SessionError::NoSigningAgent)?;
        if self.account.read().is_none() {
            return Err(SessionError::NotConnected);
        }
        agent.sign(payload).await
    }
}
