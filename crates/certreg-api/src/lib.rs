//! # certreg-api -- Axum HTTP Service for the Certificate Registry
//!
//! Exposes one [`CertificateRegistry`](certreg_registry::CertificateRegistry)
//! as the ledger a remote client talks to. Mutations arrive as signed
//! transactions; the registry derives the caller from the signer key and
//! applies its own authorization, so the HTTP layer carries no credentials.
//!
//! ## API Surface
//!
//! | Method | Path | Module |
//! |--------|------|--------|
//! | GET  | `/health/liveness`, `/health/readiness` | probes |
//! | GET  | `/v1/admin` | [`routes::admin`] |
//! | POST | `/v1/transactions` | [`routes::transactions`] |
//! | GET  | `/v1/transactions/:tx_id` | [`routes::transactions`] |
//! | GET  | `/v1/certificates/:id` | [`routes::certificates`] |
//! | GET  | `/v1/ledger/integrity` | [`routes::ledger`] |
//! | GET  | `/v1/ledger/records` | [`routes::ledger`] |
//!
//! Every error response is `{"error": {"code", "message", "details?"}}`;
//! see [`error::AppError`].

pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

pub use error::AppError;
pub use state::{AppConfig, AppState};

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Router;
use tower_http::trace::TraceLayer;

/// Assemble the application router.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::admin::router())
        .merge(routes::transactions::router())
        .merge(routes::certificates::router())
        .merge(routes::ledger::router())
        .layer(DefaultBodyLimit::max(64 * 1024));

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new()
        .merge(health)
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness probe -- always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe -- 200 while the change log verifies.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    match state.registry.verify_chain() {
        Ok(_) => (StatusCode::OK, "ready").into_response(),
        Err(e) => {
            tracing::error!(error = %e, "readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "change log integrity failure").into_response()
        }
    }
}
