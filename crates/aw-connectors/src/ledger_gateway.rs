//! Contract gateway ledger.
//!
//! Talks JSON over HTTP to a gateway process that holds the contract ABI and
//! signs transactions for the server wallets. The acting wallet is named in
//! the `X-Signer-Address` and `X-Signer-Username` headers.

use async_trait::async_trait;
use aw_core::auth::{Account, Role};
use aw_core::batch::{Batch, NewBatch};
use aw_core::ledger::{BatchLedger, BatchReceipt, LedgerError, Receipt, Signer};
use chrono::{DateTime, Utc};
use reqwest::{Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::http::HttpClient;
use crate::traits::{ConnectorConfig, ConnectorError, ConnectorResult};

pub const SIGNER_ADDRESS_HEADER: &str = "X-Signer-Address";
pub const SIGNER_USERNAME_HEADER: &str = "X-Signer-Username";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    ready: bool,
    #[serde(default)]
    contract_address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    success: bool,
    #[serde(default)]
    username: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    role: Option<Role>,
    #[serde(default)]
    registered_at: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    username: String,
    address: String,
    role: Role,
    #[serde(default)]
    registered_at: i64,
}

impl AccountResponse {
    fn into_account(self) -> Account {
        Account {
            username: self.username,
            address: self.address,
            role: self.role,
            registered_at: from_unix(self.registered_at),
        }
    }
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    username: &'a str,
    password: &'a str,
    role: Role,
    address: &'a str,
}

fn from_unix(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

/// Maps a connector failure onto a ledger error.
///
/// `not_found` supplies the error used for a 404.
fn ledger_error(err: ConnectorError, not_found: impl FnOnce() -> LedgerError) -> LedgerError {
    match err {
        ConnectorError::NotFound(_) => not_found(),
        ConnectorError::Conflict(msg)
        | ConnectorError::Unprocessable(msg)
        | ConnectorError::AuthorizationDenied(msg) => LedgerError::Reverted(msg),
        ConnectorError::InvalidResponse(msg) => LedgerError::InvalidResponse(msg),
        other => LedgerError::Transport(other.to_string()),
    }
}

fn transport(err: ConnectorError) -> LedgerError {
    ledger_error(err, || LedgerError::InvalidResponse("Unexpected 404".to_string()))
}

/// `BatchLedger` backed by an HTTP contract gateway.
pub struct GatewayLedger {
    http: HttpClient,
    contract_address: RwLock<Option<String>>,
}

impl GatewayLedger {
    pub fn new(config: ConnectorConfig) -> ConnectorResult<Self> {
        Ok(Self {
            http: HttpClient::new(config)?,
            contract_address: RwLock::new(None),
        })
    }

    fn signed(&self, method: Method, path: &str, signer: &Signer) -> RequestBuilder {
        self.http
            .request(method, path)
            .header(SIGNER_ADDRESS_HEADER, signer.address.as_str())
            .header(SIGNER_USERNAME_HEADER, signer.username.as_str())
    }

    async fn transact(
        &self,
        signer: &Signer,
        id: u64,
        action: &str,
        body: serde_json::Value,
    ) -> Result<Receipt, LedgerError> {
        let request = self
            .signed(Method::POST, &format!("/batches/{}/{}", id, action), signer)
            .json(&body);
        let receipt: Receipt = self
            .http
            .send_once_json(request)
            .await
            .map_err(|e| ledger_error(e, || LedgerError::BatchNotFound(id)))?;
        info!(batch_id = id, action, actor = %signer.username, tx = %receipt.transaction_hash, "Gateway transaction sent");
        Ok(receipt)
    }
}

#[async_trait]
impl BatchLedger for GatewayLedger {
    fn backend_name(&self) -> &str {
        "gateway"
    }

    fn contract_address(&self) -> Option<String> {
        self.contract_address
            .read()
            .ok()
            .and_then(|address| address.clone())
    }

    async fn is_ready(&self) -> bool {
        match self.http.get_json::<StatusResponse>("/status").await {
            Ok(status) => {
                if let Some(address) = status.contract_address {
                    if let Ok(mut cached) = self.contract_address.write() {
                        *cached = Some(address);
                    }
                }
                status.ready
            }
            Err(e) => {
                warn!(gateway = %self.http.base_url(), error = %e, "Contract gateway unavailable");
                false
            }
        }
    }

    #[instrument(skip(self, password))]
    async fn register_user(
        &self,
        username: &str,
        password: &str,
        role: Role,
        address: &str,
    ) -> Result<Receipt, LedgerError> {
        let request = self.http.request(Method::POST, "/users").json(&RegisterRequest {
            username,
            password,
            role,
            address,
        });
        self.http
            .send_once_json(request)
            .await
            .map_err(|e| match e {
                ConnectorError::Conflict(_) => LedgerError::DuplicateAccount(username.to_string()),
                other => transport(other),
            })
    }

    async fn verify_login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<Account>, LedgerError> {
        let body = json!({ "username": username, "password": password });
        let response: LoginResponse = match self.http.post_json("/users/verify", &body).await {
            Ok(response) => response,
            Err(ConnectorError::AuthenticationFailed(_)) | Err(ConnectorError::NotFound(_)) => {
                return Ok(None)
            }
            Err(e) => return Err(transport(e)),
        };

        if !response.success {
            return Ok(None);
        }
        let role = response.role.ok_or_else(|| {
            LedgerError::InvalidResponse("Login response is missing the role".to_string())
        })?;
        Ok(Some(Account {
            username: if response.username.is_empty() {
                username.to_string()
            } else {
                response.username
            },
            address: response.address,
            role,
            registered_at: from_unix(response.registered_at),
        }))
    }

    async fn get_account(&self, username: &str) -> Result<Option<Account>, LedgerError> {
        match self
            .http
            .get_segments_json::<AccountResponse>(&["users", username])
            .await
        {
            Ok(account) => Ok(Some(account.into_account())),
            Err(ConnectorError::NotFound(_)) => Ok(None),
            Err(e) => Err(transport(e)),
        }
    }

    async fn create_batch(
        &self,
        signer: &Signer,
        batch: NewBatch,
    ) -> Result<BatchReceipt, LedgerError> {
        batch.validate()?;
        let request = self.signed(Method::POST, "/batches", signer).json(&batch);
        let receipt: BatchReceipt = self.http.send_once_json(request).await.map_err(transport)?;
        info!(batch_id = receipt.batch_id, actor = %signer.username, "Gateway batch created");
        Ok(receipt)
    }

    async fn batch_ids(&self) -> Result<Vec<u64>, LedgerError> {
        self.http.get_json("/batches/ids").await.map_err(transport)
    }

    async fn get_batch(&self, id: u64) -> Result<Batch, LedgerError> {
        self.http
            .get_json(&format!("/batches/{}", id))
            .await
            .map_err(|e| ledger_error(e, || LedgerError::BatchNotFound(id)))
    }

    async fn approve_batch(&self, signer: &Signer, id: u64) -> Result<Receipt, LedgerError> {
        self.transact(signer, id, "approve", json!({})).await
    }

    async fn reject_batch(
        &self,
        signer: &Signer,
        id: u64,
        reason: &str,
    ) -> Result<Receipt, LedgerError> {
        self.transact(signer, id, "reject", json!({ "reason": reason }))
            .await
    }

    async fn certify_batch(
        &self,
        signer: &Signer,
        id: u64,
        certification_hash: &str,
    ) -> Result<Receipt, LedgerError> {
        self.transact(
            signer,
            id,
            "certify",
            json!({ "certificationHash": certification_hash }),
        )
        .await
    }
}
