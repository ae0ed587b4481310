//! # aw-core
//!
//! Domain model for the Aware material-tracking platform.
//!
//! This crate holds the batch lifecycle, the submission form model, the
//! per-user wallet registry, the ledger seam with its in-memory backend, and
//! the spreadsheet store used for free-form submissions.

pub mod auth;
pub mod batch;
pub mod ledger;
pub mod seed;
pub mod storage;
pub mod submission;
pub mod wallet;

pub use auth::password::{
    hash_password, validate_password_strength, verify_password, PasswordError,
};
pub use auth::{Account, Role, SessionUser};
pub use batch::{
    Batch, BatchError, BatchQuery, BatchSort, BatchStatus, Compliance, NewBatch, PhysicalAsset,
    Reviewer, Tracer, Validation, DEFAULT_REJECTION_REASON,
};
pub use ledger::{BatchLedger, BatchReceipt, InMemoryLedger, LedgerError, Receipt, Signer};
pub use seed::{seed_demo_data, SeedSummary};
pub use storage::{Record, SpreadsheetStorage, StorageError};
pub use submission::Submission;
pub use wallet::{TokenType, Wallet, WalletBalance, WalletRegistry};
