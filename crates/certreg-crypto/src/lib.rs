//! # certreg-crypto -- Signing Primitives
//!
//! Ed25519 key pairs, public keys, and signatures for the certificate
//! registry's signed-transaction interface.
//!
//! ## Crate Policy
//!
//! - Depends only on `certreg-core` internally.
//! - Signing and verification take `&CanonicalBytes`, never raw bytes.
//! - No mocking of cryptographic operations in tests. All tests use real
//!   canonical bytes and real Ed25519.

pub mod ed25519;
pub mod error;

pub use ed25519::{verify_with_public_key, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
pub use error::CryptoError;
