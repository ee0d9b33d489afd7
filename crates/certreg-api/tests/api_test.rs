//! # Integration Tests for certreg-api
//!
//! Drives the assembled router with `tower::ServiceExt::oneshot`: health
//! probes, admin lookup, signed transaction submission, verification, and
//! change-log endpoints.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use certreg_api::state::{AppConfig, AppState};
use certreg_core::{CertificateId, Timestamp};
use certreg_crypto::Ed25519KeyPair;
use certreg_registry::{
    CertificateFields, CertificateRegistry, ChangeRecord, ManualClock, Operation,
    SignedTransaction, Transaction,
};

struct Harness {
    admin: Ed25519KeyPair,
    registry: Arc<CertificateRegistry>,
}

impl Harness {
    fn new() -> Self {
        let admin = Ed25519KeyPair::generate();
        let clock = Arc::new(ManualClock::new(
            Timestamp::parse("2026-01-15T12:00:00Z").unwrap(),
        ));
        let registry = Arc::new(CertificateRegistry::new(admin.identity(), clock));
        Self { admin, registry }
    }

    fn app(&self) -> axum::Router {
        let config = AppConfig {
            port: 8080,
            admin: self.admin.identity(),
        };
        certreg_api::app(AppState::with_registry(config, self.registry.clone()))
    }
}

fn signed(key: &Ed25519KeyPair, operation: Operation) -> SignedTransaction {
    let tx = Transaction::new(operation, key.public_key());
    let signature = key.sign(&tx.signing_bytes().unwrap());
    SignedTransaction::new(tx, signature)
}

fn issue_alice(key: &Ed25519KeyPair) -> SignedTransaction {
    signed(
        key,
        Operation::Issue(CertificateFields::new("Alice", "CS101", "State U")),
    )
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read(response).await
}

async fn post_json(app: axum::Router, uri: &str, body: String) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    read(response).await
}

async fn read(response: axum::http::Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn submit(app: axum::Router, stx: &SignedTransaction) -> (StatusCode, Value) {
    post_json(app, "/v1/transactions", serde_json::to_string(stx).unwrap()).await
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_and_readiness() {
    let h = Harness::new();
    for (uri, expected) in [("/health/liveness", "ok"), ("/health/readiness", "ready")] {
        let response = h
            .app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], expected.as_bytes());
    }
}

// -- Admin --------------------------------------------------------------------

#[tokio::test]
async fn test_admin_identity() {
    let h = Harness::new();
    let (status, body) = get(h.app(), "/v1/admin").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["admin"], h.admin.identity().to_string());
}

// -- Transactions -------------------------------------------------------------

#[tokio::test]
async fn test_issue_then_verify() {
    let h = Harness::new();
    let (status, body) = submit(h.app(), &issue_alice(&h.admin)).await;
    assert_eq!(status, StatusCode::OK);
    let record: ChangeRecord = serde_json::from_value(body).unwrap();
    let id = record.issued_id().unwrap();

    let (status, view) = get(h.app(), &format!("/v1/certificates/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["student_name"], "Alice");
    assert_eq!(view["course"], "CS101");
    assert_eq!(view["institution"], "State U");
    assert_eq!(view["issue_date"], "2026-01-15T12:00:00Z");
    assert_eq!(view["is_valid"], true);
}

#[tokio::test]
async fn test_non_admin_issue_is_403() {
    let h = Harness::new();
    let outsider = Ed25519KeyPair::generate();
    let (status, body) = submit(h.app(), &issue_alice(&outsider)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    assert_eq!(body["error"]["details"]["caller"], outsider.identity().to_string());
    assert_eq!(h.registry.certificate_count(), 0);
}

#[tokio::test]
async fn test_empty_field_is_422() {
    let h = Harness::new();
    let stx = signed(
        &h.admin,
        Operation::Issue(CertificateFields::new("Alice", "  ", "State U")),
    );
    let (status, body) = submit(h.app(), &stx).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
    assert_eq!(body["error"]["details"]["field"], "course");
}

#[tokio::test]
async fn test_tampered_transaction_is_401() {
    let h = Harness::new();
    let mut stx = issue_alice(&h.admin);
    stx.transaction.operation =
        Operation::Issue(CertificateFields::new("Mallory", "CS101", "State U"));
    let (status, body) = submit(h.app(), &stx).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_SIGNATURE");
    assert_eq!(h.registry.certificate_count(), 0);
}

#[tokio::test]
async fn test_resubmission_returns_original_record() {
    let h = Harness::new();
    let stx = issue_alice(&h.admin);
    let (_, first) = submit(h.app(), &stx).await;
    let (status, second) = submit(h.app(), &stx).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, second);
    assert_eq!(h.registry.certificate_count(), 1);
}

#[tokio::test]
async fn test_revoke_twice_is_409() {
    let h = Harness::new();
    let id = h
        .registry
        .issue(
            &h.admin.identity(),
            CertificateFields::new("Alice", "CS101", "State U"),
        )
        .unwrap();

    let (status, _) = submit(h.app(), &signed(&h.admin, Operation::Revoke { id })).await;
    assert_eq!(status, StatusCode::OK);
    let (_, view) = get(h.app(), &format!("/v1/certificates/{id}")).await;
    assert_eq!(view["is_valid"], false);

    let (status, body) = submit(h.app(), &signed(&h.admin, Operation::Revoke { id })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "ALREADY_REVOKED");
}

#[tokio::test]
async fn test_malformed_body_is_400() {
    let h = Harness::new();
    let (status, body) = post_json(h.app(), "/v1/transactions", "{\"op\":".into()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_transaction_lookup() {
    let h = Harness::new();
    let stx = issue_alice(&h.admin);
    let tx_id = stx.tx_id().unwrap();

    let (status, body) = get(h.app(), &format!("/v1/transactions/{tx_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    submit(h.app(), &stx).await;
    let (status, body) = get(h.app(), &format!("/v1/transactions/{tx_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tx_id"], tx_id.to_string());
}

// -- Verification -------------------------------------------------------------

#[tokio::test]
async fn test_verify_distinguishes_missing_from_malformed() {
    let h = Harness::new();
    let absent = CertificateId::from_bytes([9; 32]);

    let (status, body) = get(h.app(), &format!("/v1/certificates/{absent}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, body) = get(h.app(), "/v1/certificates/0x12").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "MALFORMED_ID");
}

// -- Ledger -------------------------------------------------------------------

#[tokio::test]
async fn test_ledger_integrity_and_records() {
    let h = Harness::new();
    submit(h.app(), &issue_alice(&h.admin)).await;
    submit(h.app(), &issue_alice(&h.admin)).await;

    let (status, body) = get(h.app(), "/v1/ledger/integrity").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["height"], 2);

    let (status, body) = get(h.app(), "/v1/ledger/records").await;
    assert_eq!(status, StatusCode::OK);
    let records: Vec<ChangeRecord> = serde_json::from_value(body).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].prev_digest, records[0].record_digest);
}
