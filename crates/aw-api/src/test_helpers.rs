//! Shared test helpers for the aw-api crate.

use std::sync::Arc;
use tempfile::TempDir;

use aw_core::{seed_demo_data, BatchLedger, InMemoryLedger, SpreadsheetStorage, WalletRegistry};

use crate::state::AppState;

/// An [`AppState`] over an in-memory ledger and a spreadsheet in a
/// temporary directory, removed on drop.
pub struct TestContext {
    pub state: AppState,
    pub ledger: Arc<InMemoryLedger>,
    _dir: TempDir,
}

impl TestContext {
    pub async fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let storage = SpreadsheetStorage::new(dir.path().join("submissions.xlsx"))
            .expect("Failed to open spreadsheet storage");
        let ledger = Arc::new(InMemoryLedger::new());
        let state = AppState::new(ledger.clone(), WalletRegistry::new(), Arc::new(storage));

        Self {
            state,
            ledger,
            _dir: dir,
        }
    }

    /// A context whose state talks to `ledger` instead of the in-memory one.
    pub async fn with_ledger(ledger: Arc<dyn BatchLedger>) -> Self {
        let mut ctx = Self::new().await;
        ctx.state.ledger = ledger;
        ctx
    }

    /// Same as [`TestContext::new`] with the demo accounts and batches.
    pub async fn seeded() -> Self {
        let ctx = Self::new().await;
        seed_demo_data(ctx.ledger.as_ref(), &ctx.state.wallets)
            .await
            .expect("Failed to seed demo data");
        ctx
    }
}
