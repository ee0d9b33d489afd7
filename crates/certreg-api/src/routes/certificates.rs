//! `GET /v1/certificates/:id` -- open certificate verification.
//!
//! A structurally invalid id is `400 MALFORMED_ID`; a well-formed id that
//! was never issued is `404 NOT_FOUND`. Revoked certificates are returned
//! with `is_valid: false`.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use certreg_core::CertificateId;
use certreg_registry::{CertificateView, RegistryError};

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/certificates/:id", get(verify_certificate))
}

async fn verify_certificate(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<CertificateView>, AppError> {
    match state.registry.verify(&raw)? {
        Some(view) => Ok(Json(view)),
        None => {
            let id = CertificateId::parse(&raw).map_err(RegistryError::from)?;
            Err(RegistryError::NotFound(id).into())
        }
    }
}
