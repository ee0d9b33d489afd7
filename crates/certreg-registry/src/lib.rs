//! # certreg-registry -- The Certificate Registry
//!
//! An authorized issuer records academic certificates; anyone verifies a
//! certificate by presenting its identifier. This crate holds the registry
//! semantics:
//!
//! - **Certificates** ([`Certificate`], [`CertificateView`]) with
//!   content-derived ids and a one-way validity flag.
//! - **Authorization** ([`Role`]) checked inside every mutating operation.
//! - **Signed transactions** ([`SignedTransaction`]) carrying issue and
//!   revoke requests from callers holding an Ed25519 key.
//! - **Change log** ([`ChangeRecord`]) hash-chained from a zero genesis
//!   digest, with idempotent replay by transaction id.
//!
//! The registry is an explicitly constructed value with a fixed admin.
//! Share it as `Arc<CertificateRegistry>`; there is no global instance.
//!
//! ## Concurrency
//!
//! All mutations serialize behind one `parking_lot::RwLock`. Reads take the
//! shared lock. No lock is ever held across an `.await`.

pub mod certificate;
pub mod change;
pub mod clock;
pub mod error;
pub mod registry;
pub mod role;
pub mod transaction;

pub use certificate::{Certificate, CertificateFields, CertificateView, MAX_FIELD_CHARS};
pub use change::{verify_records, ChangeEvent, ChangeRecord};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::RegistryError;
pub use registry::{CertificateRegistry, ChainStatus};
pub use role::Role;
pub use transaction::{Operation, SignedTransaction, Transaction, TxId};
