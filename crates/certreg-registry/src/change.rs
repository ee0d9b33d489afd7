//! # Change Log
//!
//! Every committed mutation appends one [`ChangeRecord`]. Records are
//! hash-chained: each carries the digest of its predecessor (`prev_digest`)
//! and its own digest over the canonical record body (`record_digest`). The
//! first record links to [`ContentDigest::ZERO`].
//!
//! Altering any committed record changes its digest and breaks the link
//! from its successor, which [`verify_records`] detects.

use std::collections::HashMap;

use certreg_core::{sha256_digest, CanonicalBytes, CertificateId, ContentDigest, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::transaction::TxId;

/// A state change carried by a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChangeEvent {
    /// A certificate was created.
    CertificateIssued {
        /// The new certificate's id.
        id: CertificateId,
        /// Registry time of issuance.
        issue_date: Timestamp,
    },
    /// A certificate was revoked.
    CertificateRevoked {
        /// The revoked certificate's id.
        id: CertificateId,
        /// Registry time of revocation.
        revoked_at: Timestamp,
    },
}

/// One committed mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Position in the log, from 0.
    pub sequence: u64,
    /// Transaction that produced this record.
    pub tx_id: TxId,
    /// Digest of the previous record, or zero for the first.
    pub prev_digest: ContentDigest,
    /// What changed.
    pub events: Vec<ChangeEvent>,
    /// Registry time of commit.
    pub committed_at: Timestamp,
    /// Digest over every other field of this record.
    pub record_digest: ContentDigest,
}

/// The hashed portion of a record.
#[derive(Serialize)]
struct RecordBody<'a> {
    sequence: u64,
    tx_id: &'a TxId,
    prev_digest: &'a ContentDigest,
    events: &'a [ChangeEvent],
    committed_at: &'a Timestamp,
}

impl ChangeRecord {
    /// Build a record and compute its digest.
    pub(crate) fn seal(
        sequence: u64,
        tx_id: TxId,
        prev_digest: ContentDigest,
        events: Vec<ChangeEvent>,
        committed_at: Timestamp,
    ) -> Result<Self, RegistryError> {
        let record_digest = body_digest(sequence, &tx_id, &prev_digest, &events, &committed_at)?;
        Ok(Self {
            sequence,
            tx_id,
            prev_digest,
            events,
            committed_at,
            record_digest,
        })
    }

    /// Recompute the digest from the record's fields.
    pub fn compute_digest(&self) -> Result<ContentDigest, RegistryError> {
        body_digest(
            self.sequence,
            &self.tx_id,
            &self.prev_digest,
            &self.events,
            &self.committed_at,
        )
    }

    /// The id of the first `CertificateIssued` event, if any.
    pub fn issued_id(&self) -> Option<CertificateId> {
        self.events.iter().find_map(|e| match e {
            ChangeEvent::CertificateIssued { id, .. } => Some(*id),
            ChangeEvent::CertificateRevoked { .. } => None,
        })
    }
}

fn body_digest(
    sequence: u64,
    tx_id: &TxId,
    prev_digest: &ContentDigest,
    events: &[ChangeEvent],
    committed_at: &Timestamp,
) -> Result<ContentDigest, RegistryError> {
    let body = RecordBody {
        sequence,
        tx_id,
        prev_digest,
        events,
        committed_at,
    };
    Ok(sha256_digest(&CanonicalBytes::new(&body)?))
}

/// Check sequence numbers, links, and digests of a full log.
///
/// Returns the head digest (zero for an empty log).
pub fn verify_records(records: &[ChangeRecord]) -> Result<ContentDigest, RegistryError> {
    let mut prev = ContentDigest::ZERO;
    for (index, record) in records.iter().enumerate() {
        let expected_seq = index as u64;
        if record.sequence != expected_seq {
            return Err(RegistryError::ChainIntegrity {
                sequence: expected_seq,
                reason: format!("sequence is {}, expected {expected_seq}", record.sequence),
            });
        }
        if record.prev_digest != prev {
            return Err(RegistryError::ChainIntegrity {
                sequence: expected_seq,
                reason: format!(
                    "prev_digest {} does not match predecessor {prev}",
                    record.prev_digest
                ),
            });
        }
        let recomputed = record.compute_digest()?;
        if recomputed != record.record_digest {
            return Err(RegistryError::ChainIntegrity {
                sequence: expected_seq,
                reason: format!(
                    "record_digest {} does not match contents {recomputed}",
                    record.record_digest
                ),
            });
        }
        prev = record.record_digest;
    }
    Ok(prev)
}

/// Append-only record storage with lookup by transaction id.
#[derive(Debug, Default)]
pub(crate) struct ChangeLog {
    records: Vec<ChangeRecord>,
    by_tx: HashMap<TxId, usize>,
}

impl ChangeLog {
    pub(crate) fn height(&self) -> u64 {
        self.records.len() as u64
    }

    pub(crate) fn head_digest(&self) -> ContentDigest {
        self.records
            .last()
            .map(|r| r.record_digest)
            .unwrap_or(ContentDigest::ZERO)
    }

    pub(crate) fn get(&self, tx_id: &TxId) -> Option<&ChangeRecord> {
        self.by_tx.get(tx_id).and_then(|&i| self.records.get(i))
    }

    pub(crate) fn records(&self) -> &[ChangeRecord] {
        &self.records
    }

    /// Seal and append. The caller holds the registry write lock.
    pub(crate) fn append(
        &mut self,
        tx_id: TxId,
        events: Vec<ChangeEvent>,
        committed_at: Timestamp,
    ) -> Result<ChangeRecord, RegistryError> {
        let record = ChangeRecord::seal(
            self.height(),
            tx_id,
            self.head_digest(),
            events,
            committed_at,
        )?;
        self.by_tx.insert(tx_id, self.records.len());
        self.records.push(record.clone());
        Ok(record)
    }
}
