//! # Transports
//!
//! [`RegistryTransport`] is how a [`RegistryClient`](crate::RegistryClient)
//! reaches a registry. Two implementations ship:
//!
//! - [`LocalTransport`] calls an in-process `Arc<CertificateRegistry>`.
//! - [`HttpTransport`] talks to a `certreg-api` server.
//!
//! ## HTTP Paths
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST   | `/v1/transactions` | Submit a signed transaction |
//! | GET    | `/v1/transactions/{tx_id}` | Committed change record |
//! | GET    | `/v1/certificates/{id}` | Verify a certificate |
//! | GET    | `/v1/admin` | Admin identity |

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use certreg_core::{CertificateId, Identity};
use certreg_registry::{
    CertificateRegistry, CertificateView, ChangeRecord, RegistryError, SignedTransaction, TxId,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::ClientConfig;
use crate::error::{ClientError, TransportError};
use crate::retry::retry_send;

/// The ledger boundary as seen from a client.
#[async_trait]
pub trait RegistryTransport: Send + Sync {
    /// Submit a signed transaction and wait for its committed record.
    async fn submit(&self, tx: &SignedTransaction) -> Result<ChangeRecord, ClientError>;

    /// Look up a certificate. `None` if it was never issued.
    async fn verify(&self, id: &CertificateId) -> Result<Option<CertificateView>, ClientError>;

    /// The registry's admin identity.
    async fn admin(&self) -> Result<Identity, ClientError>;

    /// The committed record for a transaction, if it committed.
    async fn record(&self, tx_id: &TxId) -> Result<Option<ChangeRecord>, ClientError>;
}

// -- in-process ---------------------------------------------------------------

/// Direct calls into a shared registry.
#[derive(Debug, Clone)]
pub struct LocalTransport {
    registry: Arc<CertificateRegistry>,
}

impl LocalTransport {
    /// Wrap a shared registry.
    pub fn new(registry: Arc<CertificateRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl RegistryTransport for LocalTransport {
    async fn submit(&self, tx: &SignedTransaction) -> Result<ChangeRecord, ClientError> {
        Ok(self.registry.apply(tx)?)
    }

    async fn verify(&self, id: &CertificateId) -> Result<Option<CertificateView>, ClientError> {
        Ok(self.registry.lookup(id))
    }

    async fn admin(&self) -> Result<Identity, ClientError> {
        Ok(self.registry.admin_identity())
    }

    async fn record(&self, tx_id: &TxId) -> Result<Option<ChangeRecord>, ClientError> {
        Ok(self.registry.record(tx_id))
    }
}

// -- HTTP ---------------------------------------------------------------------

#[derive(Deserialize)]
struct WireErrorBody {
    error: WireError,
}

#[derive(Deserialize)]
struct WireError {
    code: String,
    #[serde(default)]
    details: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct AdminResponse {
    admin: Identity,
}

/// Client for the `certreg-api` HTTP service.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: url::Url,
}

impl HttpTransport {
    /// Build a transport from configuration.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TransportError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.as_str().trim_end_matches('/'))
    }

    /// GET a resource. `None` only when the registry itself answers
    /// `NOT_FOUND`; a 404 from anything else (wrong base URL, a proxy) is an
    /// error.
    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        url: &str,
    ) -> Result<Option<T>, ClientError> {
        let resp = retry_send(endpoint, || self.http.get(url).send())
            .await
            .map_err(|e| TransportError::Http {
                endpoint: endpoint.to_string(),
                source: e,
            })?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            let body = resp.text().await.unwrap_or_default();
            if is_registry_miss(&body) {
                return Ok(None);
            }
            return Err(decode_error(endpoint, 404, body));
        }
        read_json(endpoint, resp).await.map(Some)
    }
}

#[async_trait]
impl RegistryTransport for HttpTransport {
    async fn submit(&self, tx: &SignedTransaction) -> Result<ChangeRecord, ClientError> {
        let endpoint = "POST /v1/transactions";
        let url = self.url("v1/transactions");
        let resp = retry_send(endpoint, || self.http.post(&url).json(tx).send())
            .await
            .map_err(|e| TransportError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;
        read_json(endpoint, resp).await
    }

    async fn verify(&self, id: &CertificateId) -> Result<Option<CertificateView>, ClientError> {
        let endpoint = format!("GET /v1/certificates/{id}");
        let url = self.url(&format!("v1/certificates/{id}"));
        self.get(&endpoint, &url).await
    }

    async fn admin(&self) -> Result<Identity, ClientError> {
        let endpoint = "GET /v1/admin";
        let url = self.url("v1/admin");
        let body: Option<AdminResponse> = self.get(endpoint, &url).await?;
        body.map(|b| b.admin).ok_or_else(|| {
            TransportError::Api {
                endpoint: endpoint.into(),
                status: 404,
                body: String::new(),
            }
            .into()
        })
    }

    async fn record(&self, tx_id: &TxId) -> Result<Option<ChangeRecord>, ClientError> {
        let endpoint = format!("GET /v1/transactions/{tx_id}");
        let url = self.url(&format!("v1/transactions/{tx_id}"));
        self.get(&endpoint, &url).await
    }
}

async fn read_json<T: DeserializeOwned>(
    endpoint: &str,
    resp: reqwest::Response,
) -> Result<T, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(decode_error(endpoint, status.as_u16(), body));
    }
    resp.json().await.map_err(|e| {
        TransportError::Deserialization {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

fn is_registry_miss(body: &str) -> bool {
    serde_json::from_str::<WireErrorBody>(body)
        .map(|b| b.error.code == "NOT_FOUND")
        .unwrap_or(false)
}

/// Turn an error response back into the registry error it carries, or a
/// transport error if it carries none.
fn decode_error(endpoint: &str, status: u16, body: String) -> ClientError {
    let registry_error = serde_json::from_str::<WireErrorBody>(&body)
        .ok()
        .and_then(|b| RegistryError::from_wire(&b.error.code, b.error.details.as_ref()));
    match registry_error {
        Some(err) => ClientError::Registry(err),
        None => TransportError::Api {
            endpoint: endpoint.to_string(),
            status,
            body,
        }
        .into(),
    }
}
