//! # certreg-client -- Client side of the certificate registry
//!
//! A [`RegistryClient`] combines three things:
//!
//! - an [`IdentitySession`] that resolves the caller's identity through a
//!   [`SigningAgent`] and signs transactions,
//! - a [`RegistryTransport`] that reaches the registry, either in-process
//!   ([`LocalTransport`]) or over HTTP ([`HttpTransport`]),
//! - a table of in-flight requests, optionally mirrored to a file, so an
//!   abandoned or timed-out submission can be retried without committing
//!   twice, even from a new process.
//!
//! Errors keep the registry's own variants ([`ClientError::Registry`]), so
//! "not found", "malformed id" and "already revoked" stay distinguishable
//! all the way to the user.

pub mod client;
pub mod config;
pub mod error;
pub mod pending;
pub(crate) mod retry;
pub mod session;
pub mod transport;

pub use client::{extract_issued_id, RegistryClient};
pub use config::{ClientConfig, ConfigError};
pub use error::{ClientError, TransportError};
pub use pending::PendingStoreError;
pub use session::{IdentitySession, KeyPairAgent, SessionError, SigningAgent};
pub use transport::{HttpTransport, LocalTransport, RegistryTransport};
