//! `GET /v1/admin` -- the registry's fixed admin identity.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use certreg_core::Identity;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Admin lookup response.
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminResponse {
    pub admin: Identity,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/admin", get(get_admin))
}

async fn get_admin(State(state): State<AppState>) -> Json<AdminResponse> {
    Json(AdminResponse {
        admin: state.registry.admin_identity(),
    })
}
