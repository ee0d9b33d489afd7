//! # Certificate Registry
//!
//! [`CertificateRegistry`] owns the certificate table and the change log
//! behind a single `parking_lot::RwLock`. Mutations take the write lock for
//! their whole check-then-commit sequence, so concurrent revocations of one
//! certificate resolve with exactly one success.
//!
//! Two entry points mutate state:
//!
//! - [`CertificateRegistry::issue`] / [`CertificateRegistry::revoke`] take an
//!   already-authenticated caller identity.
//! - [`CertificateRegistry::apply`] takes a [`SignedTransaction`], verifies
//!   the signature, derives the caller from the signer key, and replays the
//!   original record if the transaction was committed before.
//!
//! ## Error order
//!
//! - issue: `Unauthorized`, then `InvalidInput`.
//! - revoke: `Unauthorized`, then `NotFound`, then `AlreadyRevoked`.
//!
//! A rejected operation leaves no trace in state or log.

use std::collections::HashMap;
use std::sync::Arc;

use certreg_core::{sha256_digest, CanonicalBytes, CertificateId, ContentDigest, Identity, Timestamp};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::certificate::{derive_id, Certificate, CertificateFields, CertificateView};
use crate::change::{verify_records, ChangeEvent, ChangeLog, ChangeRecord};
use crate::clock::{Clock, SystemClock};
use crate::error::RegistryError;
use crate::role::Role;
use crate::transaction::{Operation, SignedTransaction, TxId};

/// Result of a change-log integrity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainStatus {
    /// Number of committed records.
    pub height: u64,
    /// Digest of the last record, zero when empty.
    pub head_digest: ContentDigest,
}

#[derive(Debug, Default)]
struct State {
    certificates: HashMap<CertificateId, Certificate>,
    log: ChangeLog,
    issued: u64,
}

/// A mutation that passed every check but is not yet applied.
enum Staged {
    Issue(Certificate),
    Revoke(CertificateId, Timestamp),
}

impl Staged {
    fn event(&self) -> ChangeEvent {
        match self {
            Self::Issue(cert) => ChangeEvent::CertificateIssued {
                id: cert.id,
                issue_date: cert.issue_date,
            },
            Self::Revoke(id, at) => ChangeEvent::CertificateRevoked {
                id: *id,
                revoked_at: *at,
            },
        }
    }
}

/// The certificate registry.
#[derive(Debug)]
pub struct CertificateRegistry {
    admin: Identity,
    clock: Arc<dyn Clock>,
    state: RwLock<State>,
}

impl CertificateRegistry {
    /// A registry administered by `admin`, using `clock` for issue dates.
    pub fn new(admin: Identity, clock: Arc<dyn Clock>) -> Self {
        info!(admin = %admin, "certificate registry created");
        Self {
            admin,
            clock,
            state: RwLock::new(State::default()),
        }
    }

    /// A registry on wall-clock time.
    pub fn with_system_clock(admin: Identity) -> Self {
        Self::new(admin, Arc::new(SystemClock))
    }

    /// The admin identity fixed at construction.
    pub fn admin_identity(&self) -> Identity {
        self.admin
    }

    /// The role `caller` holds in this registry.
    pub fn role_of(&self, caller: &Identity) -> Role {
        if *caller == self.admin {
            Role::Admin
        } else {
            Role::Public
        }
    }

    /// Fail with `Unauthorized` unless `caller` holds `required`.
    pub fn authorize(&self, caller: &Identity, required: Role) -> Result<(), RegistryError> {
        if self.role_of(caller).satisfies(required) {
            Ok(())
        } else {
            Err(RegistryError::Unauthorized {
                caller: *caller,
                required,
            })
        }
    }

    // -- mutations ----------------------------------------------------------

    /// Issue a certificate as `caller`. Returns its id.
    pub fn issue(
        &self,
        caller: &Identity,
        fields: CertificateFields,
    ) -> Result<CertificateId, RegistryError> {
        let operation = Operation::Issue(fields);
        let record = self.commit_direct(caller, &operation)?;
        record.issued_id().ok_or_else(|| {
            RegistryError::Canonicalization("issue committed without an issued event".to_string())
        })
    }

    /// Revoke certificate `id` as `caller`.
    pub fn revoke(&self, caller: &Identity, id: &CertificateId) -> Result<(), RegistryError> {
        self.commit_direct(caller, &Operation::Revoke { id: *id })?;
        Ok(())
    }

    /// Apply a signed transaction and return its change record.
    ///
    /// A transaction whose id is already in the log is not re-executed; the
    /// original record is returned.
    pub fn apply(&self, stx: &SignedTransaction) -> Result<ChangeRecord, RegistryError> {
        if let Err(err) = stx.verify_signature() {
            warn!(op = stx.transaction.operation.name(), error = %err, "rejected transaction");
            return Err(err);
        }
        let tx_id = stx.tx_id()?;
        let caller = stx.transaction.caller();

        let mut state = self.state.write();
        if let Some(existing) = state.log.get(&tx_id) {
            info!(tx_id = %tx_id, sequence = existing.sequence, "replayed committed transaction");
            return Ok(existing.clone());
        }
        self.commit_locked(&mut state, &caller, &stx.transaction.operation, tx_id)
    }

    fn commit_direct(
        &self,
        caller: &Identity,
        operation: &Operation,
    ) -> Result<ChangeRecord, RegistryError> {
        let mut state = self.state.write();
        let tx_id = direct_tx_id(caller, operation, state.log.height())?;
        self.commit_locked(&mut state, caller, operation, tx_id)
    }

    fn commit_locked(
        &self,
        state: &mut State,
        caller: &Identity,
        operation: &Operation,
        tx_id: TxId,
    ) -> Result<ChangeRecord, RegistryError> {
        let now = self.clock.now();
        let staged = match operation {
            Operation::Issue(fields) => self.stage_issue(state, caller, fields, now),
            Operation::Revoke { id } => self.stage_revoke(state, caller, id, now),
        };
        let staged = staged.map_err(|err| {
            warn!(op = operation.name(), caller = %caller, error = %err, "rejected operation");
            err
        })?;

        let record = state.log.append(tx_id, vec![staged.event()], now)?;
        match staged {
            Staged::Issue(cert) => {
                info!(id = %cert.id, sequence = record.sequence, "certificate issued");
                state.issued += 1;
                state.certificates.insert(cert.id, cert);
            }
            Staged::Revoke(id, at) => {
                if let Some(cert) = state.certificates.get_mut(&id) {
                    cert.is_valid = false;
                    cert.revoked_at = Some(at);
                }
                info!(id = %id, sequence = record.sequence, "certificate revoked");
            }
        }
        Ok(record)
    }

    fn stage_issue(
        &self,
        state: &State,
        caller: &Identity,
        fields: &CertificateFields,
        now: Timestamp,
    ) -> Result<Staged, RegistryError> {
        self.authorize(caller, Role::Admin)?;
        fields.validate()?;
        let id = derive_id(fields, *caller, now, state.issued)?;
        Ok(Staged::Issue(Certificate {
            id,
            fields: fields.clone(),
            issue_date: now,
            issuer: *caller,
            is_valid: true,
            revoked_at: None,
        }))
    }

    fn stage_revoke(
        &self,
        state: &State,
        caller: &Identity,
        id: &CertificateId,
        now: Timestamp,
    ) -> Result<Staged, RegistryError> {
        self.authorize(caller, Role::Admin)?;
        let cert = state
            .certificates
            .get(id)
            .ok_or(RegistryError::NotFound(*id))?;
        if !cert.is_valid {
            return Err(RegistryError::AlreadyRevoked(*id));
        }
        Ok(Staged::Revoke(*id, now))
    }

    // -- reads --------------------------------------------------------------

    /// Look up a certificate by its textual id.
    ///
    /// `MalformedId` if the text is not a certificate id; `Ok(None)` if no
    /// such certificate was ever issued.
    pub fn verify(&self, id: &str) -> Result<Option<CertificateView>, RegistryError> {
        let id = CertificateId::parse(id)?;
        Ok(self.lookup(&id))
    }

    /// Look up a certificate by parsed id.
    pub fn lookup(&self, id: &CertificateId) -> Option<CertificateView> {
        let view = self.state.read().certificates.get(id).map(Certificate::view);
        debug!(id = %id, found = view.is_some(), "certificate lookup");
        view
    }

    /// Number of certificates ever issued.
    pub fn certificate_count(&self) -> u64 {
        self.state.read().issued
    }

    /// A copy of the full change log.
    pub fn change_log(&self) -> Vec<ChangeRecord> {
        self.state.read().log.records().to_vec()
    }

    /// The committed record for `tx_id`.
    pub fn record(&self, tx_id: &TxId) -> Option<ChangeRecord> {
        self.state.read().log.get(tx_id).cloned()
    }

    /// Number of committed records.
    pub fn height(&self) -> u64 {
        self.state.read().log.height()
    }

    /// Recompute every record digest and link.
    pub fn verify_chain(&self) -> Result<ChainStatus, RegistryError> {
        let state = self.state.read();
        let head_digest = verify_records(state.log.records())?;
        Ok(ChainStatus {
            height: state.log.height(),
            head_digest,
        })
    }
}

/// Transaction id for an operation that arrived without a signed envelope.
fn direct_tx_id(
    caller: &Identity,
    operation: &Operation,
    height: u64,
) -> Result<TxId, RegistryError> {
    #[derive(Serialize)]
    struct Direct<'a> {
        caller: &'a Identity,
        operation: &'a Operation,
        height: u64,
    }
    let canonical = CanonicalBytes::new(&Direct {
        caller,
        operation,
        height,
    })?;
    Ok(TxId::from_digest(sha256_digest(&canonical)))
}
