//! Contract client seam.
//!
//! Accounts and batches live on a ledger the application does not own. The
//! [`BatchLedger`] trait is the only way handlers reach it; `InMemoryLedger`
//! backs development and tests, while the connectors crate provides an HTTP
//! gateway implementation.

mod memory;

pub use memory::InMemoryLedger;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::{Account, Role, SessionUser};
use crate::batch::{Batch, BatchError, NewBatch};

/// Errors returned by ledger operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    /// The ledger connection is not established.
    #[error("Blockchain not ready")]
    NotReady,

    #[error("Batch not found: {0}")]
    BatchNotFound(u64),

    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Account already registered: {0}")]
    DuplicateAccount(String),

    /// A lifecycle rule rejected the operation.
    #[error(transparent)]
    Lifecycle(#[from] BatchError),

    /// The contract reverted the transaction.
    #[error("Transaction reverted: {0}")]
    Reverted(String),

    #[error("Ledger transport error: {0}")]
    Transport(String),

    #[error("Invalid ledger response: {0}")]
    InvalidResponse(String),
}

/// The logged-in user acting through their server wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signer {
    pub username: String,
    pub address: String,
    pub role: Role,
}

impl From<&SessionUser> for Signer {
    fn from(user: &SessionUser) -> Self {
        Self {
            username: user.username.clone(),
            address: user.address.clone(),
            role: user.role,
        }
    }
}

/// Result of a state-changing transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub transaction_hash: String,
}

/// Result of recording a new batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReceipt {
    pub batch_id: u64,
    pub transaction_hash: String,
}

/// Access to the batch-tracking contract.
#[async_trait]
pub trait BatchLedger: Send + Sync {
    /// Short backend identifier, e.g. `"memory"`.
    fn backend_name(&self) -> &str;

    /// Address of the deployed contract, if known.
    fn contract_address(&self) -> Option<String>;

    /// Whether the ledger can accept calls.
    async fn is_ready(&self) -> bool;

    async fn register_user(
        &self,
        username: &str,
        password: &str,
        role: Role,
        address: &str,
    ) -> Result<Receipt, LedgerError>;

    /// Checks credentials. Returns `None` for unknown users or wrong
    /// passwords alike.
    async fn verify_login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<Account>, LedgerError>;

    async fn get_account(&self, username: &str) -> Result<Option<Account>, LedgerError>;

    async fn create_batch(
        &self,
        signer: &Signer,
        batch: NewBatch,
    ) -> Result<BatchReceipt, LedgerError>;

    /// Ids of every recorded batch, ascending.
    async fn batch_ids(&self) -> Result<Vec<u64>, LedgerError>;

    async fn get_batch(&self, id: u64) -> Result<Batch, LedgerError>;

    /// Reads every batch in id order.
    async fn list_batches(&self) -> Result<Vec<Batch>, LedgerError> {
        let mut batches = Vec::new();
        for id in self.batch_ids().await? {
            batches.push(self.get_batch(id).await?);
        }
        Ok(batches)
    }

    async fn approve_batch(&self, signer: &Signer, id: u64) -> Result<Receipt, LedgerError>;

    async fn reject_batch(
        &self,
        signer: &Signer,
        id: u64,
        reason: &str,
    ) -> Result<Receipt, LedgerError>;

    async fn certify_batch(
        &self,
        signer: &Signer,
        id: u64,
        certification_hash: &str,
    ) -> Result<Receipt, LedgerError>;
}
