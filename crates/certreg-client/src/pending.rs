//! # Pending Requests
//!
//! Mutating requests that were signed but have not reached a definitive
//! outcome. The table can be mirrored to a JSON file, so a later process
//! resubmits the same signed transaction instead of signing a new one.
//!
//! The file is rewritten whole on every change (write to a sibling `.tmp`,
//! then rename).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use certreg_core::{ContentDigest, Timestamp};
use certreg_registry::{SignedTransaction, TxId};
use serde::{Deserialize, Serialize};

const FILE_VERSION: u32 = 1;

/// Failure reading or writing the pending-request file.
#[derive(Debug, thiserror::Error)]
pub enum PendingStoreError {
    /// The file could not be read or written.
    #[error("pending request file {path}: {source}")]
    Io {
        /// Path involved.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file exists but does not hold a pending-request table.
    #[error("pending request file {path} is unreadable: {reason}")]
    Corrupt {
        /// Path that was read.
        path: String,
        /// Decoder message.
        reason: String,
    },
}

/// Identifies one logical mutating request: digest of its operation and signer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct RequestKey(pub(crate) ContentDigest);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct PendingEntry {
    pub(crate) key: RequestKey,
    pub(crate) created_at: Timestamp,
    pub(crate) transaction: SignedTransaction,
}

impl PendingEntry {
    pub(crate) fn tx_id(&self) -> Option<TxId> {
        self.transaction.tx_id().ok()
    }
}

#[derive(Deserialize)]
struct PendingFile {
    version: u32,
    entries: Vec<PendingEntry>,
}

#[derive(Serialize)]
struct PendingFileRef<'a> {
    version: u32,
    entries: Vec<&'a PendingEntry>,
}

#[derive(Debug, Default)]
pub(crate) struct PendingTable {
    entries: HashMap<RequestKey, PendingEntry>,
    path: Option<PathBuf>,
}

impl PendingTable {
    pub(crate) fn in_memory() -> Self {
        Self::default()
    }

    /// Load the table mirrored at `path`. A missing file is an empty table.
    pub(crate) fn open(path: &Path) -> Result<Self, PendingStoreError> {
        let entries = match fs::read_to_string(path) {
            Ok(text) => {
                let file: PendingFile =
                    serde_json::from_str(&text).map_err(|e| corrupt(path, e.to_string()))?;
                if file.version != FILE_VERSION {
                    return Err(corrupt(path, format!("unsupported version {}", file.version)));
                }
                file.entries.into_iter().map(|e| (e.key, e)).collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(io_error(path, e)),
        };
        Ok(Self {
            entries,
            path: Some(path.to_path_buf()),
        })
    }

    pub(crate) fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn get(&self, key: &RequestKey) -> Option<&SignedTransaction> {
        self.entries.get(key).map(|e| &e.transaction)
    }

    /// Store `stx` under `key` unless something is already there, and return
    /// whichever transaction the table holds afterwards. Nothing is kept if
    /// the file cannot be written.
    pub(crate) fn insert_if_absent(
        &mut self,
        key: RequestKey,
        stx: SignedTransaction,
        now: Timestamp,
    ) -> Result<SignedTransaction, PendingStoreError> {
        if let Some(existing) = self.entries.get(&key) {
            return Ok(existing.transaction.clone());
        }
        self.entries.insert(
            key,
            PendingEntry {
                key,
                created_at: now,
                transaction: stx.clone(),
            },
        );
        if let Err(e) = self.save() {
            self.entries.remove(&key);
            return Err(e);
        }
        Ok(stx)
    }

    pub(crate) fn remove(&mut self, key: &RequestKey) -> Result<bool, PendingStoreError> {
        if self.entries.remove(key).is_none() {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// Keep only the entries for which `keep` holds. Returns how many were dropped.
    pub(crate) fn retain(
        &mut self,
        mut keep: impl FnMut(&PendingEntry) -> bool,
    ) -> Result<usize, PendingStoreError> {
        let before = self.entries.len();
        self.entries.retain(|_, e| keep(e));
        let dropped = before - self.entries.len();
        if dropped > 0 {
            self.save()?;
        }
        Ok(dropped)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Transaction ids, oldest first.
    pub(crate) fn tx_ids(&self) -> Vec<TxId> {
        self.sorted().into_iter().filter_map(PendingEntry::tx_id).collect()
    }

    fn sorted(&self) -> Vec<&PendingEntry> {
        let mut entries: Vec<&PendingEntry> = self.entries.values().collect();
        entries.sort_by_key(|e| (e.created_at, e.key.0));
        entries
    }

    fn save(&self) -> Result<(), PendingStoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;
        }
        let file = PendingFileRef {
            version: FILE_VERSION,
            entries: self.sorted(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(|e| corrupt(path, e.to_string()))?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, json).map_err(|e| io_error(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| io_error(path, e))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> PendingStoreError {
    PendingStoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn corrupt(path: &Path, reason: String) -> PendingStoreError {
    PendingStoreError::Corrupt {
        path: path.display().to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certreg_crypto::Ed25519KeyPair;
    use certreg_registry::{CertificateFields, Operation, Transaction};

    fn signed(kp: &Ed25519KeyPair) -> SignedTransaction {
        let tx = Transaction::new(
            Operation::Issue(CertificateFields::new("Alice", "CS101", "State U")),
            kp.public_key(),
        );
        let sig = kp.sign(&tx.signing_bytes().unwrap());
        SignedTransaction::new(tx, sig)
    }

    fn t0() -> Timestamp {
        Timestamp::parse("2026-01-15T12:00:00Z").unwrap()
    }

    #[test]
    fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let table = PendingTable::open(&dir.path().join("pending.json")).unwrap();
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("pending.json");
        let kp = Ed25519KeyPair::generate();
        let key = RequestKey(ContentDigest::from_bytes([1; 32]));
        let stx = signed(&kp);

        let mut table = PendingTable::open(&path).unwrap();
        table.insert_if_absent(key, stx.clone(), t0()).unwrap();

        let reopened = PendingTable::open(&path).unwrap();
        assert_eq!(reopened.get(&key), Some(&stx));
        assert_eq!(reopened.tx_ids(), vec![stx.tx_id().unwrap()]);
    }

    #[test]
    fn first_insert_wins() {
        let kp = Ed25519KeyPair::generate();
        let key = RequestKey(ContentDigest::from_bytes([2; 32]));
        let first = signed(&kp);
        let mut table = PendingTable::in_memory();
        table.insert_if_absent(key, first.clone(), t0()).unwrap();
        let kept = table.insert_if_absent(key, signed(&kp), t0()).unwrap();
        assert_eq!(kept, first);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn removal_is_written_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pending.json");
        let key = RequestKey(ContentDigest::from_bytes([3; 32]));
        let mut table = PendingTable::open(&path).unwrap();
        table
            .insert_if_absent(key, signed(&Ed25519KeyPair::generate()), t0())
            .unwrap();

        assert!(table.remove(&key).unwrap());
        assert!(!table.remove(&key).unwrap());
        assert_eq!(PendingTable::open(&path).unwrap().len(), 0);
    }

    #[test]
    fn garbage_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pending.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            PendingTable::open(&path),
            Err(PendingStoreError::Corrupt { .. })
        ));

        fs::write(&path, r#"{"version":99,"entries":[]}"#).unwrap();
        assert!(matches!(
            PendingTable::open(&path),
            Err(PendingStoreError::Corrupt { .. })
        ));
    }
}
