//! # Transaction Routes
//!
//! - `POST /v1/transactions` -- apply a signed issue or revoke transaction.
//!   Responds with the committed change record. Resubmitting a transaction
//!   that already committed returns the original record.
//! - `GET /v1/transactions/:tx_id` -- the committed record for a transaction.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use certreg_registry::{ChangeRecord, SignedTransaction, TxId};

use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/transactions", post(submit_transaction))
        .route("/v1/transactions/:tx_id", get(get_transaction))
}

async fn submit_transaction(
    State(state): State<AppState>,
    body: Result<Json<SignedTransaction>, JsonRejection>,
) -> Result<Json<ChangeRecord>, AppError> {
    let stx = extract_json(body)?;
    let record = state.registry.apply(&stx)?;
    Ok(Json(record))
}

async fn get_transaction(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<ChangeRecord>, AppError> {
    let tx_id = TxId::parse(&raw)?;
    state
        .registry
        .record(&tx_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("transaction {tx_id}")))
}
