#![deny(missing_docs)]

//! # certreg-core -- Foundational Types for the Certificate Registry
//!
//! Every other crate in the workspace depends on this one. It has no internal
//! crate dependencies -- only `serde`, `serde_json`, `thiserror`, `chrono`, and
//! `sha2` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** A [`CertificateId`] and an
//!    [`Identity`] are distinct types with structural validation at parse
//!    time. A malformed id never reaches the registry's lookup path.
//!
//! 2. **[`CanonicalBytes`] is the sole path to digests and signatures.**
//!    Certificate ids, transaction ids, and change-record digests all flow
//!    through `CanonicalBytes::new()`.
//!
//! 3. **UTC-only [`Timestamp`]** with second precision, so registry time
//!    is deterministic inside digests.
//!
//! 4. **Structured errors with `thiserror`** -- no `Box<dyn Error>`, no
//!    `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

// Re-export primary types at crate root for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, sha256_hex, ContentDigest};
pub use error::{CanonicalizationError, ValidationError};
pub use identity::{CertificateId, Identity};
pub use temporal::Timestamp;
