//! In-process ledger used for development and tests.

use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{BatchLedger, BatchReceipt, LedgerError, Receipt, Signer};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::{Account, Role};
use crate::batch::{Batch, NewBatch, Reviewer};
use crate::wallet::random_address;

struct StoredAccount {
    account: Account,
    password_hash: String,
}

/// Ledger that keeps accounts and batches in memory.
///
/// Batch ids start at 1 and increase monotonically. The acting role is
/// always taken from the registered account, never from the signer.
pub struct InMemoryLedger {
    contract_address: String,
    accounts: Arc<RwLock<HashMap<String, StoredAccount>>>,
    batches: Arc<RwLock<BTreeMap<u64, Batch>>>,
    next_id: AtomicU64,
    nonce: AtomicU64,
    ready: AtomicBool,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            contract_address: random_address(),
            accounts: Arc::new(RwLock::new(HashMap::new())),
            batches: Arc::new(RwLock::new(BTreeMap::new())),
            next_id: AtomicU64::new(1),
            nonce: AtomicU64::new(0),
            ready: AtomicBool::new(true),
        }
    }

    /// Toggles readiness, simulating a lost contract connection.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub async fn account_count(&self) -> usize {
        self.accounts.read().await.len()
    }

    fn ensure_ready(&self) -> Result<(), LedgerError> {
        if self.ready.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(LedgerError::NotReady)
        }
    }

    fn transaction_hash(&self, operation: &str, payload: &str) -> String {
        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        let mut hasher = Sha256::new();
        hasher.update(nonce.to_be_bytes());
        hasher.update(operation.as_bytes());
        hasher.update(payload.as_bytes());
        format!("0x{}", hex::encode(hasher.finalize()))
    }

    /// Resolves the registered role of the signer.
    async fn role_of(&self, signer: &Signer) -> Result<Role, LedgerError> {
        self.accounts
            .read()
            .await
            .get(&signer.username)
            .map(|stored| stored.account.role)
            .ok_or_else(|| LedgerError::UnknownAccount(signer.username.clone()))
    }

    async fn transition<F>(
        &self,
        signer: &Signer,
        id: u64,
        operation: &str,
        apply: F,
    ) -> Result<Receipt, LedgerError>
    where
        F: FnOnce(&mut Batch, &Reviewer<'_>, i64) -> Result<(), crate::batch::BatchError> + Send,
    {
        self.ensure_ready()?;
        let role = self.role_of(signer).await?;
        let reviewer = Reviewer {
            address: &signer.address,
            username: &signer.username,
            role,
        };

        let mut batches = self.batches.write().await;
        let batch = batches.get_mut(&id).ok_or(LedgerError::BatchNotFound(id))?;
        apply(batch, &reviewer, Utc::now().timestamp())?;

        let transaction_hash = self.transaction_hash(operation, &format!("{}:{}", id, signer.address));
        info!(
            batch_id = id,
            status = %batch.status,
            actor = %signer.username,
            "Batch {}", operation
        );
        Ok(Receipt { transaction_hash })
    }
}

#[async_trait]
impl BatchLedger for InMemoryLedger {
    fn backend_name(&self) -> &str {
        "memory"
    }

    fn contract_address(&self) -> Option<String> {
        Some(self.contract_address.clone())
    }

    async fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn register_user(
        &self,
        username: &str,
        password: &str,
        role: Role,
        address: &str,
    ) -> Result<Receipt, LedgerError> {
        self.ensure_ready()?;
        let password_hash =
            hash_password(password).map_err(|e| LedgerError::Reverted(e.to_string()))?;

        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(username) {
            return Err(LedgerError::DuplicateAccount(username.to_string()));
        }
        accounts.insert(
            username.to_string(),
            StoredAccount {
                account: Account::new(username, address, role),
                password_hash,
            },
        );
        drop(accounts);

        debug!(username = %username, role = %role, "Registered account");
        Ok(Receipt {
            transaction_hash: self.transaction_hash("registerUser", username),
        })
    }

    async fn verify_login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<Account>, LedgerError> {
        self.ensure_ready()?;
        let accounts = self.accounts.read().await;
        let Some(stored) = accounts.get(username) else {
            return Ok(None);
        };
        let valid = verify_password(password, &stored.password_hash)
            .map_err(|e| LedgerError::InvalidResponse(e.to_string()))?;
        Ok(valid.then(|| stored.account.clone()))
    }

    async fn get_account(&self, username: &str) -> Result<Option<Account>, LedgerError> {
        self.ensure_ready()?;
        Ok(self
            .accounts
            .read()
            .await
            .get(username)
            .map(|stored| stored.account.clone()))
    }

    async fn create_batch(
        &self,
        signer: &Signer,
        batch: NewBatch,
    ) -> Result<BatchReceipt, LedgerError> {
        self.ensure_ready()?;
        batch.validate()?;
        let role = self.role_of(signer).await?;
        let creator = Reviewer {
            address: &signer.address,
            username: &signer.username,
            role,
        };

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let asset_id = batch.physical_asset.asset_id.clone();
        let record = Batch::new(id, batch, &creator, Utc::now().timestamp());
        self.batches.write().await.insert(id, record);

        info!(batch_id = id, asset_id = %asset_id, creator = %signer.username, "Batch created");
        Ok(BatchReceipt {
            batch_id: id,
            transaction_hash: self.transaction_hash("createBatch", &asset_id),
        })
    }

    async fn batch_ids(&self) -> Result<Vec<u64>, LedgerError> {
        self.ensure_ready()?;
        Ok(self.batches.read().await.keys().copied().collect())
    }

    async fn get_batch(&self, id: u64) -> Result<Batch, LedgerError> {
        self.ensure_ready()?;
        self.batches
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(LedgerError::BatchNotFound(id))
    }

    async fn list_batches(&self) -> Result<Vec<Batch>, LedgerError> {
        self.ensure_ready()?;
        Ok(self.batches.read().await.values().cloned().collect())
    }

    async fn approve_batch(&self, signer: &Signer, id: u64) -> Result<Receipt, LedgerError> {
        self.transition(signer, id, "approved", |batch, reviewer, now| {
            batch.approve(reviewer, now)
        })
        .await
    }

    async fn reject_batch(
        &self,
        signer: &Signer,
        id: u64,
        reason: &str,
    ) -> Result<Receipt, LedgerError> {
        self.transition(signer, id, "rejected", |batch, reviewer, now| {
            batch.reject(reviewer, reason, now)
        })
        .await
    }

    async fn certify_batch(
        &self,
        signer: &Signer,
        id: u64,
        certification_hash: &str,
    ) -> Result<Receipt, LedgerError> {
        self.transition(signer, id, "certified", |batch, reviewer, now| {
            batch.certify(reviewer, certification_hash, now)
        })
        .await
    }
}
