//! # Ledger Routes
//!
//! - `GET /v1/ledger/integrity` -- recompute every change-record digest and
//!   link; responds with the verified height and head digest, or
//!   `500 CHAIN_INTEGRITY` naming the first bad record.
//! - `GET /v1/ledger/records` -- the full change log, oldest first.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use certreg_registry::{ChainStatus, ChangeRecord};

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/ledger/integrity", get(integrity))
        .route("/v1/ledger/records", get(records))
}

async fn integrity(State(state): State<AppState>) -> Result<Json<ChainStatus>, AppError> {
    Ok(Json(state.registry.verify_chain()?))
}

async fn records(State(state): State<AppState>) -> Json<Vec<ChangeRecord>> {
    Json(state.registry.change_log())
}
