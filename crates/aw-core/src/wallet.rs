//! Per-user server wallets and token balances.
//!
//! A wallet is an identity handle: an address the ledger knows the user by
//! and an accumulated weight per material token. It holds no keys.

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::batch::{Batch, PhysicalAsset};

/// Material family a batch weight is credited under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TokenType {
    Cotton,
    Wool,
    Silk,
    Polyester,
    Nylon,
    Linen,
    Other,
}

const TOKEN_KEYWORDS: &[(&str, TokenType)] = &[
    ("cotton", TokenType::Cotton),
    ("wool", TokenType::Wool),
    ("merino", TokenType::Wool),
    ("cashmere", TokenType::Wool),
    ("silk", TokenType::Silk),
    ("polyester", TokenType::Polyester),
    ("nylon", TokenType::Nylon),
    ("polyamide", TokenType::Nylon),
    ("linen", TokenType::Linen),
    ("flax", TokenType::Linen),
    ("hemp", TokenType::Linen),
];

impl TokenType {
    /// Classifies a material description. The first keyword found wins.
    pub fn classify(material: &str) -> Self {
        let material = material.to_lowercase();
        TOKEN_KEYWORDS
            .iter()
            .find(|(keyword, _)| material.contains(keyword))
            .map(|(_, token)| *token)
            .unwrap_or(TokenType::Other)
    }

    /// Classifies a batch, preferring an explicit token type over the
    /// material description.
    pub fn for_asset(asset: &PhysicalAsset) -> Self {
        let explicit = TokenType::classify(&asset.token_type);
        if explicit != TokenType::Other {
            return explicit;
        }
        TokenType::classify(&asset.material)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Cotton => "Cotton",
            TokenType::Wool => "Wool",
            TokenType::Silk => "Silk",
            TokenType::Polyester => "Polyester",
            TokenType::Nylon => "Nylon",
            TokenType::Linen => "Linen",
            TokenType::Other => "Other",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's server-side wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub username: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    /// Accumulated kilograms per token.
    pub balances: BTreeMap<TokenType, f64>,
}

impl Wallet {
    fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            address: random_address(),
            created_at: Utc::now(),
            balances: BTreeMap::new(),
        }
    }

    fn add(&mut self, token: TokenType, kg: f64) {
        *self.balances.entry(token).or_insert(0.0) += kg;
    }

    pub fn total(&self) -> f64 {
        self.balances.values().sum()
    }
}

/// Balance view returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletBalance {
    pub username: String,
    pub address: String,
    pub balances: BTreeMap<TokenType, f64>,
    pub total: f64,
}

impl From<&Wallet> for WalletBalance {
    fn from(wallet: &Wallet) -> Self {
        Self {
            username: wallet.username.clone(),
            address: wallet.address.clone(),
            balances: wallet.balances.clone(),
            total: wallet.total(),
        }
    }
}

/// Generates a `0x`-prefixed 20-byte hex address.
pub fn random_address() -> String {
    let mut bytes = [0u8; 20];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("0x{}", hex::encode(bytes))
}

/// In-memory map of wallets keyed by username.
#[derive(Debug, Clone, Default)]
pub struct WalletRegistry {
    wallets: Arc<RwLock<HashMap<String, Wallet>>>,
}

impl WalletRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the user's wallet, creating one on first use.
    ///
    /// The boolean is `true` when the wallet was just created.
    pub async fn get_or_create(&self, username: &str) -> (Wallet, bool) {
        if let Some(wallet) = self.wallets.read().await.get(username) {
            return (wallet.clone(), false);
        }

        let mut wallets = self.wallets.write().await;
        if let Some(wallet) = wallets.get(username) {
            return (wallet.clone(), false);
        }
        let wallet = Wallet::new(username);
        info!(username = %username, address = %wallet.address, "Created server wallet");
        wallets.insert(username.to_string(), wallet.clone());
        (wallet, true)
    }

    pub async fn get(&self, username: &str) -> Option<Wallet> {
        self.wallets.read().await.get(username).cloned()
    }

    /// Credits the asset's weight to the user under its token.
    ///
    /// Returns the token credited, or `None` when the user has no wallet or
    /// the weight is unusable.
    pub async fn credit(&self, username: &str, asset: &PhysicalAsset) -> Option<TokenType> {
        let kg = asset.weight_kg()?;
        let token = TokenType::for_asset(asset);

        let mut wallets = self.wallets.write().await;
        let wallet = wallets.get_mut(username)?;
        wallet.add(token, kg);
        debug!(username = %username, token = %token, kg, "Credited wallet");
        Some(token)
    }

    /// Recomputes the user's balances from every accepted batch they created.
    pub async fn resync(&self, username: &str, batches: &[Batch]) -> Option<WalletBalance> {
        let mut wallets = self.wallets.write().await;
        let wallet = wallets.get_mut(username)?;

        wallet.balances.clear();
        for batch in batches
            .iter()
            .filter(|b| b.created_by_name == username && b.status.is_accepted())
        {
            if let Some(kg) = batch.physical_asset.weight_kg() {
                wallet.add(TokenType::for_asset(&batch.physical_asset), kg);
            }
        }
        Some(WalletBalance::from(&*wallet))
    }

    pub async fn balance(&self, username: &str) -> Option<WalletBalance> {
        self.wallets
            .read()
            .await
            .get(username)
            .map(WalletBalance::from)
    }

    pub async fn len(&self) -> usize {
        self.wallets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.wallets.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::batch::{NewBatch, Reviewer};

    fn asset(material: &str, weight: &str) -> PhysicalAsset {
        PhysicalAsset {
            material: material.to_string(),
            weight: weight.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_classification() {
        assert_eq!(TokenType::classify("Organic Cotton"), TokenType::Cotton);
        assert_eq!(TokenType::classify("MERINO blend"), TokenType::Wool);
        assert_eq!(TokenType::classify("Cashmere"), TokenType::Wool);
        assert_eq!(TokenType::classify("Mulberry Silk"), TokenType::Silk);
        assert_eq!(TokenType::classify("recycled polyester"), TokenType::Polyester);
        assert_eq!(TokenType::classify("Polyamide 6"), TokenType::Nylon);
        assert_eq!(TokenType::classify("Hemp"), TokenType::Linen);
        assert_eq!(TokenType::classify("Bamboo"), TokenType::Other);
        assert_eq!(TokenType::classify("cotton/wool"), TokenType::Cotton);
    }

    #[test]
    fn test_explicit_token_type_wins() {
        let mut a = asset("Blend", "10");
        a.token_type = "Wool".to_string();
        assert_eq!(TokenType::for_asset(&a), TokenType::Wool);
    }

    #[test]
    fn test_random_address_shape() {
        let address = random_address();
        assert!(address.starts_with("0x"));
        assert_eq!(address.len(), 42);
        assert_ne!(address, random_address());
    }

    #[tokio::test]
    async fn test_get_or_create_is_stable() {
        let registry = WalletRegistry::new();
        let (first, created) = registry.get_or_create("producer1").await;
        assert!(created);
        let (second, created) = registry.get_or_create("producer1").await;
        assert!(!created);
        assert_eq!(first.address, second.address);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_credit_accumulates() {
        let registry = WalletRegistry::new();
        registry.get_or_create("producer1").await;

        assert_eq!(
            registry.credit("producer1", &asset("Organic Cotton", "500")).await,
            Some(TokenType::Cotton)
        );
        registry.credit("producer1", &asset("cotton", "250 kg")).await;
        assert_eq!(registry.credit("producer1", &asset("Silk", "n/a")).await, None);
        assert_eq!(registry.credit("nobody", &asset("Silk", "1")).await, None);

        let balance = registry.balance("producer1").await.unwrap();
        assert_eq!(balance.balances.get(&TokenType::Cotton), Some(&750.0));
        assert_eq!(balance.total, 750.0);
    }

    #[tokio::test]
    async fn test_resync_counts_accepted_batches_only() {
        let registry = WalletRegistry::new();
        registry.get_or_create("producer1").await;

        let creator = Reviewer {
            address: "0x01",
            username: "producer1",
            role: Role::Producer,
        };
        let reviewer = Reviewer {
            address: "0x02",
            username: "manufacturer1",
            role: Role::Manufacturer,
        };
        let payload = |material: &str, weight: &str| NewBatch {
            physical_asset: asset(material, weight),
            ..Default::default()
        };

        let mut approved = Batch::new(1, payload("Merino Wool", "300"), &creator, 0);
        approved.approve(&reviewer, 1).unwrap();
        let pending = Batch::new(2, payload("Cotton", "500"), &creator, 0);
        let mut rejected = Batch::new(3, payload("Silk", "100"), &creator, 0);
        rejected.reject(&reviewer, "", 1).unwrap();

        let balance = registry
            .resync("producer1", &[approved, pending, rejected])
            .await
            .unwrap();
        assert_eq!(balance.balances.len(), 1);
        assert_eq!(balance.balances.get(&TokenType::Wool), Some(&300.0));

        let json = serde_json::to_value(&balance).unwrap();
        assert_eq!(json["balances"]["Wool"], 300.0);
    }
}
