//! # Registry Subcommands
//!
//! Each command drives a [`RegistryClient`] and renders the outcome as a
//! [`Report`]. Failures come back as [`ClientError`] and are rendered by the
//! caller with [`failure_lines`] and [`exit::code_for`](crate::exit::code_for).

use std::time::Duration;

use certreg_client::{ClientError, RegistryClient};
use certreg_core::CertificateId;
use certreg_registry::{CertificateFields, ChangeEvent, RegistryError, TxId};

use crate::{exit, Report};

/// Print the identity of the configured key.
pub async fn cmd_whoami(client: &RegistryClient) -> Result<Report, ClientError> {
    let identity = client.connect_identity().await?;
    let signer = client.session().signer()?;
    Ok(Report::ok(vec![
        format!("Identity:   {identity}"),
        format!("Public key: {}", signer.to_hex()),
    ]))
}

/// Print the registry admin, and whether the configured key is it.
pub async fn cmd_admin(client: &RegistryClient) -> Result<Report, ClientError> {
    let admin = client.current_admin().await?;
    let mut lines = vec![format!("Admin: {admin}")];
    if let Ok(me) = client.connect_identity().await {
        if me == admin {
            lines.push("  (the configured key is the admin)".to_string());
        }
    }
    Ok(Report::ok(lines))
}

/// Issue a certificate.
pub async fn cmd_issue(
    client: &RegistryClient,
    fields: CertificateFields,
) -> Result<Report, ClientError> {
    client.connect_identity().await?;
    let id = client.submit_issue(fields).await?;
    Ok(Report::ok(vec![
        "OK: certificate issued".to_string(),
        format!("  Id: {id}"),
    ]))
}

/// Look up a certificate. Exits [`exit::REVOKED`] for a revoked one.
pub async fn cmd_verify(client: &RegistryClient, id: &str) -> Result<Report, ClientError> {
    let view = client.submit_verify(id).await?;
    let status = if view.is_valid { "VALID" } else { "REVOKED" };
    let mut lines = vec![
        format!("{status}: {}", view.id),
        format!("  Student:     {}", view.student_name),
        format!("  Course:      {}", view.course),
        format!("  Institution: {}", view.institution),
        format!("  Issued:      {}", view.issue_date),
        format!("  Issuer:      {}", view.issuer),
    ];
    if let Some(revoked_at) = view.revoked_at {
        lines.push(format!("  Revoked:     {revoked_at}"));
    }
    Ok(Report {
        exit: if view.is_valid {
            exit::SUCCESS
        } else {
            exit::REVOKED
        },
        lines,
    })
}

/// Revoke a certificate.
pub async fn cmd_revoke(client: &RegistryClient, id: &str) -> Result<Report, ClientError> {
    let id = CertificateId::parse(id).map_err(RegistryError::from)?;
    client.connect_identity().await?;
    let record = client.submit_revoke(&id).await?;
    Ok(Report::ok(vec![
        format!("OK: certificate {id} revoked"),
        format!("  Record: #{} ({})", record.sequence, record.tx_id),
    ]))
}

/// List requests whose outcome is unknown, after optionally dropping one by
/// transaction id or all those older than `expire_secs`.
pub fn cmd_pending(
    client: &RegistryClient,
    discard: Option<&str>,
    expire_secs: Option<u64>,
) -> Result<Report, ClientError> {
    let mut lines = Vec::new();
    if let Some(tx_id) = discard {
        let tx_id = TxId::parse(tx_id)?;
        if !client.discard_pending(&tx_id)? {
            return Ok(Report {
                exit: exit::NOT_FOUND,
                lines: vec![format!("Transaction {tx_id} is not pending")],
            });
        }
        lines.push(format!("Discarded {tx_id}"));
    }
    if let Some(secs) = expire_secs {
        let dropped = client.expire_pending(Duration::from_secs(secs))?;
        lines.push(format!("Expired {dropped} pending request(s)"));
    }
    let pending = client.pending_tx_ids();
    if pending.is_empty() {
        lines.push("No pending requests".to_string());
    }
    lines.extend(pending.iter().map(|tx_id| format!("Pending: {tx_id}")));
    Ok(Report::ok(lines))
}

/// Lines for stderr when a command fails. When the outcome is unknown, the
/// pending transactions are listed so they can be passed to `certreg recover`.
pub fn failure_lines(client: &RegistryClient, err: &ClientError) -> Vec<String> {
    let mut lines = vec![err.notice()];
    if !err.is_definitive() {
        for tx_id in client.pending_tx_ids() {
            lines.push(format!("  Pending transaction: {tx_id}"));
            lines.push(format!("    check with: certreg recover {tx_id}"));
        }
    }
    lines
}

/// Show the committed record of a transaction, if it committed.
pub async fn cmd_recover(client: &RegistryClient, tx_id: &str) -> Result<Report, ClientError> {
    let tx_id = TxId::parse(tx_id)?;
    let Some(record) = client.recover(&tx_id).await? else {
        return Ok(Report {
            exit: exit::NOT_FOUND,
            lines: vec![format!("Transaction {tx_id} has not committed")],
        });
    };
    let mut lines = vec![format!(
        "Committed: record #{} at {}",
        record.sequence, record.committed_at
    )];
    for event in &record.events {
        lines.push(match event {
            ChangeEvent::CertificateIssued { id, .. } => format!("  Issued:  {id}"),
            ChangeEvent::CertificateRevoked { id, .. } => format!("  Revoked: {id}"),
        });
    }
    Ok(Report::ok(lines))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use std::path::Path;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use certreg_client::{
        IdentitySession, KeyPairAgent, LocalTransport, RegistryTransport, TransportError,
    };
    use certreg_core::{Identity, Timestamp};
    use certreg_crypto::Ed25519KeyPair;
    use certreg_registry::{
        CertificateRegistry, CertificateView, ChangeRecord, ManualClock, SignedTransaction,
    };

    /// Commits the first submission, then answers it with a gateway timeout.
    struct DropsFirstResponse {
        inner: LocalTransport,
        dropped: AtomicBool,
    }

    #[async_trait]
    impl RegistryTransport for DropsFirstResponse {
        async fn submit(&self, tx: &SignedTransaction) -> Result<ChangeRecord, ClientError> {
            let record = self.inner.submit(tx).await?;
            if !self.dropped.swap(true, Ordering::SeqCst) {
                return Err(TransportError::Api {
                    endpoint: "POST /v1/transactions".into(),
                    status: 504,
                    body: String::new(),
                }
                .into());
            }
            Ok(record)
        }

        async fn verify(&self, id: &CertificateId) -> Result<Option<CertificateView>, ClientError> {
            self.inner.verify(id).await
        }

        async fn admin(&self) -> Result<Identity, ClientError> {
            self.inner.admin().await
        }

        async fn record(&self, tx_id: &TxId) -> Result<Option<ChangeRecord>, ClientError> {
            self.inner.record(tx_id).await
        }
    }

    /// A fresh CLI process: new client, same key seed, same pending file.
    fn process(
        seed: &[u8; 32],
        transport: Arc<dyn RegistryTransport>,
        pending_file: &Path,
    ) -> RegistryClient {
        RegistryClient::new(
            IdentitySession::new(Arc::new(KeyPairAgent::new(Ed25519KeyPair::from_seed(seed)))),
            transport,
        )
        .with_pending_file(pending_file)
        .unwrap()
    }

    fn registry(admin: &Ed25519KeyPair) -> Arc<CertificateRegistry> {
        let clock = Arc::new(ManualClock::new(
            Timestamp::parse("2026-01-15T12:00:00Z").unwrap(),
        ));
        Arc::new(CertificateRegistry::new(admin.identity(), clock))
    }

    fn client(key: Ed25519KeyPair, registry: Arc<CertificateRegistry>) -> RegistryClient {
        RegistryClient::new(
            IdentitySession::new(Arc::new(KeyPairAgent::new(key))),
            Arc::new(LocalTransport::new(registry)),
        )
    }

    fn alice() -> CertificateFields {
        CertificateFields::new("Alice", "CS101", "State U")
    }

    #[tokio::test]
    async fn issue_verify_revoke_reports() {
        let admin = Ed25519KeyPair::generate();
        let reg = registry(&admin);
        let c = client(admin, reg.clone());

        let issued = cmd_issue(&c, alice()).await.unwrap();
        assert_eq!(issued.exit, exit::SUCCESS);
        let id = reg.change_log()[0].issued_id().unwrap().to_string();
        assert!(issued.lines[1].contains(&id));

        let valid = cmd_verify(&c, &id).await.unwrap();
        assert_eq!(valid.exit, exit::SUCCESS);
        assert!(valid.lines[0].starts_with("VALID"));

        cmd_revoke(&c, &id).await.unwrap();
        let revoked = cmd_verify(&c, &id).await.unwrap();
        assert_eq!(revoked.exit, exit::REVOKED);
        assert!(revoked.lines.iter().any(|l| l.contains("Revoked:")));

        let again = cmd_revoke(&c, &id).await.unwrap_err();
        assert_eq!(exit::code_for(&again), exit::ALREADY_REVOKED);
    }

    #[tokio::test]
    async fn non_admin_issue_exits_unauthorized() {
        let admin = Ed25519KeyPair::generate();
        let c = client(Ed25519KeyPair::generate(), registry(&admin));
        let err = cmd_issue(&c, alice()).await.unwrap_err();
        assert_eq!(exit::code_for(&err), exit::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn verify_missing_and_malformed() {
        let admin = Ed25519KeyPair::generate();
        let reg = registry(&admin);
        let c = client(admin, reg);
        let missing = CertificateId::from_bytes([3; 32]).to_string();
        let err = cmd_verify(&c, &missing).await.unwrap_err();
        assert_eq!(exit::code_for(&err), exit::NOT_FOUND);
        let err = cmd_verify(&c, "0xnope").await.unwrap_err();
        assert_eq!(exit::code_for(&err), exit::MALFORMED_ID);
    }

    #[tokio::test]
    async fn admin_marks_self() {
        let admin = Ed25519KeyPair::generate();
        let identity = admin.identity();
        let reg = registry(&admin);
        let c = client(admin, reg);
        let report = cmd_admin(&c).await.unwrap();
        assert_eq!(report.lines[0], format!("Admin: {identity}"));
        assert_eq!(report.lines.len(), 2);
    }

    #[tokio::test]
    async fn rerun_after_lost_response_reuses_transaction() {
        let dir = tempfile::tempdir().unwrap();
        let pending_file = crate::default_pending_file(&dir.path().join("admin.key"));
        let seed = [9u8; 32];
        let reg = registry(&Ed25519KeyPair::from_seed(&seed));
        let transport: Arc<dyn RegistryTransport> = Arc::new(DropsFirstResponse {
            inner: LocalTransport::new(reg.clone()),
            dropped: AtomicBool::new(false),
        });

        let first = process(&seed, transport.clone(), &pending_file);
        let err = cmd_issue(&first, alice()).await.unwrap_err();
        assert_eq!(exit::code_for(&err), exit::UNREACHABLE);
        let tx_id = first.pending_tx_ids()[0];
        let stderr = failure_lines(&first, &err);
        assert!(stderr.iter().any(|l| l.contains(&format!("certreg recover {tx_id}"))));
        drop(first);

        let second = process(&seed, transport, &pending_file);
        let issued = cmd_issue(&second, alice()).await.unwrap();
        assert_eq!(reg.certificate_count(), 1);
        let id = reg.change_log()[0].issued_id().unwrap();
        assert!(issued.lines[1].contains(&id.to_string()));

        let recovered = cmd_recover(&second, &tx_id.to_string()).await.unwrap();
        assert!(recovered.lines.iter().any(|l| l.contains(&id.to_string())));
        assert!(cmd_pending(&second, None, None).unwrap().lines[0].contains("No pending"));
    }

    #[tokio::test]
    async fn definitive_failure_lists_no_transactions() {
        let admin = Ed25519KeyPair::generate();
        let c = client(Ed25519KeyPair::generate(), registry(&admin));
        let err = cmd_issue(&c, alice()).await.unwrap_err();
        assert_eq!(failure_lines(&c, &err), vec![err.notice()]);
    }

    #[tokio::test]
    async fn pending_lists_and_discards() {
        let dir = tempfile::tempdir().unwrap();
        let pending_file = dir.path().join("admin.pending.json");
        let seed = [10u8; 32];
        let reg = registry(&Ed25519KeyPair::from_seed(&seed));
        let transport: Arc<dyn RegistryTransport> = Arc::new(DropsFirstResponse {
            inner: LocalTransport::new(reg),
            dropped: AtomicBool::new(false),
        });
        let c = process(&seed, transport, &pending_file);
        c.connect_identity().await.unwrap();
        assert!(c.submit_issue(alice()).await.is_err());
        let tx_id = c.pending_tx_ids()[0].to_string();

        let listed = cmd_pending(&c, None, None).unwrap();
        assert_eq!(listed.lines, vec![format!("Pending: {tx_id}")]);

        let discarded = cmd_pending(&c, Some(&tx_id), None).unwrap();
        assert_eq!(discarded.lines[0], format!("Discarded {tx_id}"));
        let again = cmd_pending(&c, Some(&tx_id), None).unwrap();
        assert_eq!(again.exit, exit::NOT_FOUND);

        let other = Arc::new(LocalTransport::new(registry(&Ed25519KeyPair::generate())));
        let reopened = process(&seed, other, &pending_file);
        assert_eq!(reopened.pending_requests(), 0);
    }

    #[tokio::test]
    async fn recover_unknown_transaction() {
        let admin = Ed25519KeyPair::generate();
        let reg = registry(&admin);
        let c = client(admin, reg);
        let tx = TxId::from_digest(certreg_core::ContentDigest::from_bytes([1; 32]));
        let report = cmd_recover(&c, &tx.to_string()).await.unwrap();
        assert_eq!(report.exit, exit::NOT_FOUND);
    }
}
