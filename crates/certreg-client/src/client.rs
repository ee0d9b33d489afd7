//! # Registry Client
//!
//! The request/response boundary between a caller and the registry. Builds
//! and signs transactions through the [`IdentitySession`], hands them to a
//! [`RegistryTransport`], and decodes results into typed values.
//!
//! ## In-flight requests
//!
//! Each mutating request is keyed by a digest of its operation and signer.
//! The signed transaction for a key is created once and reused until a
//! definitive outcome (commit or deterministic rejection) arrives. If the
//! call is dropped, times out, or hits a transport failure, the entry stays,
//! and the next identical request resubmits the same transaction. The
//! registry answers a known transaction id with the original record, so a
//! retried issue never creates a second certificate.
//!
//! By default the table lives in memory. [`RegistryClient::with_pending_file`]
//! mirrors it to disk so a retry from a new process resumes the same
//! transaction. Entries nobody comes back for can be dropped with
//! [`discard_pending`](RegistryClient::discard_pending) or
//! [`expire_pending`](RegistryClient::expire_pending).
//!
//! The pending table's lock is never held across an `.await`.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use certreg_core::{sha256_digest, CanonicalBytes, CertificateId, Identity, Timestamp};
use certreg_crypto::Ed25519PublicKey;
use certreg_registry::{
    CertificateFields, CertificateView, ChangeRecord, Operation, RegistryError, SignedTransaction,
    Transaction, TxId,
};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::pending::{PendingTable, RequestKey};
use crate::session::IdentitySession;
use crate::transport::RegistryTransport;

impl RequestKey {
    fn new(operation: &Operation, signer: &Ed25519PublicKey) -> Result<Self, ClientError> {
        #[derive(Serialize)]
        struct Key<'a> {
            operation: &'a Operation,
            signer: &'a Ed25519PublicKey,
        }
        let canonical = CanonicalBytes::new(&Key { operation, signer })
            .map_err(RegistryError::from)?;
        Ok(Self(sha256_digest(&canonical)))
    }
}

/// Client-facing surface of the certificate registry.
pub struct RegistryClient {
    session: IdentitySession,
    transport: Arc<dyn RegistryTransport>,
    pending: Mutex<PendingTable>,
}

impl std::fmt::Debug for RegistryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pending = self.pending.lock();
        f.debug_struct("RegistryClient")
            .field("session", &self.session)
            .field("pending", &pending.len())
            .field("pending_file", &pending.path())
            .finish()
    }
}

impl RegistryClient {
    /// A client speaking through `transport` on behalf of `session`.
    pub fn new(session: IdentitySession, transport: Arc<dyn RegistryTransport>) -> Self {
        Self {
            session,
            transport,
            pending: Mutex::new(PendingTable::in_memory()),
        }
    }

    /// Mirror the pending table to `path`, picking up whatever an earlier
    /// process left there.
    pub fn with_pending_file(self, path: &Path) -> Result<Self, ClientError> {
        let table = PendingTable::open(path)?;
        if table.len() > 0 {
            info!(path = %path.display(), pending = table.len(), "loaded pending requests");
        }
        *self.pending.lock() = table;
        Ok(self)
    }

    /// The identity session.
    pub fn session(&self) -> &IdentitySession {
        &self.session
    }

    /// Resolve the caller's identity through the signing agent.
    pub async fn connect_identity(&self) -> Result<Identity, ClientError> {
        Ok(self.session.connect().await?)
    }

    /// The registry's admin identity.
    pub async fn current_admin(&self) -> Result<Identity, ClientError> {
        self.transport.admin().await
    }

    /// Issue a certificate and return its id.
    pub async fn submit_issue(&self, fields: CertificateFields) -> Result<CertificateId, ClientError> {
        let record = self.submit_operation(Operation::Issue(fields)).await?;
        extract_issued_id(&record)
    }

    /// Revoke a certificate.
    pub async fn submit_revoke(&self, id: &CertificateId) -> Result<ChangeRecord, ClientError> {
        self.submit_operation(Operation::Revoke { id: *id }).await
    }

    /// Look up a certificate by its textual id.
    ///
    /// Malformed ids are rejected here, before any request is sent. A
    /// certificate that was never issued yields `RegistryError::NotFound`.
    pub async fn submit_verify(&self, id: &str) -> Result<CertificateView, ClientError> {
        let id = CertificateId::parse(id).map_err(RegistryError::from)?;
        match self.transport.verify(&id).await? {
            Some(view) => Ok(view),
            None => {
                debug!(id = %id, "certificate not found");
                Err(RegistryError::NotFound(id).into())
            }
        }
    }

    /// Find the committed record of a transaction whose call was abandoned.
    pub async fn recover(&self, tx_id: &TxId) -> Result<Option<ChangeRecord>, ClientError> {
        let record = self.transport.record(tx_id).await?;
        if let Some(record) = &record {
            let committed = record.tx_id;
            if let Err(e) = self.pending.lock().retain(|e| e.tx_id() != Some(committed)) {
                warn!(tx_id = %committed, error = %e, "could not clear recovered request");
            }
        }
        Ok(record)
    }

    /// Stop tracking a pending transaction. A later identical request then
    /// signs a fresh one. Returns whether `tx_id` was pending.
    pub fn discard_pending(&self, tx_id: &TxId) -> Result<bool, ClientError> {
        let dropped = self.pending.lock().retain(|e| e.tx_id() != Some(*tx_id))?;
        Ok(dropped > 0)
    }

    /// Stop tracking pending transactions at least `max_age` old. Returns how
    /// many were dropped.
    pub fn expire_pending(&self, max_age: Duration) -> Result<usize, ClientError> {
        let max_age = i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX);
        let now = Timestamp::now().epoch_secs();
        let dropped = self
            .pending
            .lock()
            .retain(|e| now.saturating_sub(e.created_at.epoch_secs()) < max_age)?;
        if dropped > 0 {
            debug!(dropped, "expired pending requests");
        }
        Ok(dropped)
    }

    /// Number of requests still awaiting a definitive outcome.
    pub fn pending_requests(&self) -> usize {
        self.pending.lock().len()
    }

    /// Transaction ids of requests still awaiting a definitive outcome,
    /// oldest first.
    pub fn pending_tx_ids(&self) -> Vec<TxId> {
        self.pending.lock().tx_ids()
    }

    async fn submit_operation(&self, operation: Operation) -> Result<ChangeRecord, ClientError> {
        let signer = self.session.signer()?;
        let key = RequestKey::new(&operation, &signer)?;
        let stx = self.pending_or_sign(key, operation, signer).await?;
        let tx_id = stx.tx_id()?;

        match self.transport.submit(&stx).await {
            Ok(record) => {
                self.settle(&key, &tx_id);
                info!(tx_id = %tx_id, sequence = record.sequence, "transaction committed");
                Ok(record)
            }
            Err(err) if err.is_definitive() => {
                self.settle(&key, &tx_id);
                warn!(tx_id = %tx_id, error = %err, "transaction rejected");
                Err(err)
            }
            Err(err) => {
                warn!(tx_id = %tx_id, error = %err, "transaction outcome unknown; kept pending");
                Err(err)
            }
        }
    }

    async fn pending_or_sign(
        &self,
        key: RequestKey,
        operation: Operation,
        signer: Ed25519PublicKey,
    ) -> Result<SignedTransaction, ClientError> {
        if let Some(existing) = self.pending.lock().get(&key).cloned() {
            debug!("resubmitting pending transaction");
            return Ok(existing);
        }
        let tx = Transaction::new(operation, signer);
        let signature = self.session.sign(&tx.signing_bytes()?).await?;
        let stx = SignedTransaction::new(tx, signature);
        // Another call may have raced us here; keep whichever landed first.
        Ok(self
            .pending
            .lock()
            .insert_if_absent(key, stx, Timestamp::now())?)
    }

    fn settle(&self, key: &RequestKey, tx_id: &TxId) {
        if let Err(e) = self.pending.lock().remove(key) {
            warn!(tx_id = %tx_id, error = %e, "could not clear settled request");
        }
    }
}

/// Read the new certificate id out of an issue record.
pub fn extract_issued_id(record: &ChangeRecord) -> Result<CertificateId, ClientError> {
    record
        .issued_id()
        .ok_or(ClientError::IdExtractionFailed {
            tx_id: record.tx_id,
        })
}
