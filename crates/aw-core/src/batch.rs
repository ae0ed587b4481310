//! Batch records and their lifecycle.
//!
//! A batch is a tracked lot of physical material. It is created `Pending`,
//! reviewed into `Approved` or `Rejected`, and an approved batch may be
//! `Certified`. Rejected and certified batches are terminal.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

use crate::auth::Role;

/// Reason recorded when a reviewer rejects without giving one.
pub const DEFAULT_REJECTION_REASON: &str = "No reason provided";

// ============================================================================
// Batch Status
// ============================================================================

/// Lifecycle status of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum BatchStatus {
    /// Awaiting review.
    Pending,
    /// Accepted by a reviewer.
    Approved,
    /// Refused by a reviewer.
    Rejected,
    /// Approved and certified.
    Certified,
}

impl BatchStatus {
    /// Returns the numeric code used by the ledger.
    pub fn code(&self) -> u8 {
        match self {
            BatchStatus::Pending => 0,
            BatchStatus::Approved => 1,
            BatchStatus::Rejected => 2,
            BatchStatus::Certified => 3,
        }
    }

    /// Resolves a numeric ledger code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(BatchStatus::Pending),
            1 => Some(BatchStatus::Approved),
            2 => Some(BatchStatus::Rejected),
            3 => Some(BatchStatus::Certified),
            _ => None,
        }
    }

    /// Returns the display label.
    pub fn label(&self) -> &'static str {
        match self {
            BatchStatus::Pending => "Pending",
            BatchStatus::Approved => "Approved",
            BatchStatus::Rejected => "Rejected",
            BatchStatus::Certified => "Certified",
        }
    }

    /// Parses a numeric code or a case-insensitive label.
    pub fn parse(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        if let Ok(code) = trimmed.parse::<u8>() {
            return Self::from_code(code);
        }
        [
            BatchStatus::Pending,
            BatchStatus::Approved,
            BatchStatus::Rejected,
            BatchStatus::Certified,
        ]
        .into_iter()
        .find(|status| status.label().eq_ignore_ascii_case(trimmed))
    }

    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchStatus::Rejected | BatchStatus::Certified)
    }

    /// Whether the batch counts towards its creator's token balance.
    pub fn is_accepted(&self) -> bool {
        matches!(self, BatchStatus::Approved | BatchStatus::Certified)
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: BatchStatus) -> bool {
        matches!(
            (self, next),
            (BatchStatus::Pending, BatchStatus::Approved)
                | (BatchStatus::Pending, BatchStatus::Rejected)
                | (BatchStatus::Approved, BatchStatus::Certified)
        )
    }
}

impl From<BatchStatus> for u8 {
    fn from(status: BatchStatus) -> Self {
        status.code()
    }
}

impl TryFrom<u8> for BatchStatus {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        BatchStatus::from_code(code).ok_or_else(|| format!("Unknown batch status: {}", code))
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors raised by lifecycle operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: BatchStatus, to: BatchStatus },

    #[error("Role {role} is not permitted to {action} batches")]
    NotPermitted { action: &'static str, role: Role },

    #[error("A batch cannot be reviewed by its creator")]
    SelfReview,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

// ============================================================================
// Batch sections
// ============================================================================

/// Physical description of the material lot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PhysicalAsset {
    pub asset_id: String,
    pub material: String,
    pub composition: String,
    pub weight: String,
    pub batch_number: String,
    pub production_date: String,
    pub expiry_date: String,
    pub color: String,
    pub color_hex: String,
    pub production_facility: String,
    pub value_chain_main: String,
    pub value_chain_sub: String,
    pub token_type: String,
    pub material_spec: String,
    pub main_color: String,
    pub sustainable_claims: String,
    pub wet_processing: String,
}

impl PhysicalAsset {
    /// Parses the free-form weight as kilograms.
    ///
    /// Accepts a leading decimal number with an optional unit suffix
    /// (`"500"`, `"500 kg"`, `"12.5kg"`). Negative or unparsable weights
    /// yield `None`.
    pub fn weight_kg(&self) -> Option<f64> {
        let trimmed = self.weight.trim();
        let numeric: String = trimmed
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
            .map(|c| if c == ',' { '.' } else { c })
            .collect();
        numeric
            .parse::<f64>()
            .ok()
            .filter(|w| w.is_finite() && *w >= 0.0)
    }
}

/// Origin and tracer reference of the material.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Tracer {
    pub supplier: String,
    pub farm_location: String,
    pub country: String,
    pub gps_coordinates: String,
    pub certifications: String,
    pub harvest_date: String,
    pub tracer_type: String,
    pub tracer_name: String,
    pub tracer_date: String,
    pub tracer_added: String,
}

/// Quality inspection results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Validation {
    pub quality_grade: String,
    pub moisture_content: String,
    pub contamination: String,
    pub inspection_date: String,
    pub inspector: String,
    pub lab_results: String,
    pub validation_type: String,
}

/// Regulatory and sustainability compliance data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Compliance {
    pub regulatory_standards: String,
    pub sustainability_cert: String,
    pub fair_trade_cert: String,
    pub organic_cert: String,
    pub carbon_footprint: String,
    pub water_usage: String,
    pub selected_certs: String,
}

/// Payload for recording a new batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewBatch {
    pub physical_asset: PhysicalAsset,
    pub tracer: Tracer,
    pub validation: Validation,
    pub compliance: Compliance,
}

impl NewBatch {
    /// Checks the fields a batch cannot be recorded without.
    pub fn validate(&self) -> Result<(), BatchError> {
        if self.physical_asset.asset_id.trim().is_empty() {
            return Err(BatchError::MissingField("physicalAsset.assetId"));
        }
        if self.physical_asset.material.trim().is_empty() {
            return Err(BatchError::MissingField("physicalAsset.material"));
        }
        Ok(())
    }
}

// ============================================================================
// Batch
// ============================================================================

/// The party performing a lifecycle operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reviewer<'a> {
    pub address: &'a str,
    pub username: &'a str,
    pub role: Role,
}

/// A batch as read back from the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub id: u64,
    pub physical_asset: PhysicalAsset,
    pub tracer: Tracer,
    pub validation: Validation,
    pub compliance: Compliance,
    pub created_by: String,
    pub created_by_name: String,
    pub created_by_role: Role,
    /// Unix seconds.
    pub created_at: i64,
    pub status: BatchStatus,
    #[serde(default)]
    pub approved_by: String,
    #[serde(default)]
    pub approved_by_name: String,
    #[serde(default)]
    pub approved_at: i64,
    #[serde(default)]
    pub rejection_reason: String,
    #[serde(default)]
    pub certified_by: String,
    #[serde(default)]
    pub certified_by_name: String,
    #[serde(default)]
    pub certified_at: i64,
    #[serde(default)]
    pub certification_hash: String,
}

impl Batch {
    /// Creates a pending batch from a creation payload.
    pub fn new(id: u64, payload: NewBatch, creator: &Reviewer<'_>, created_at: i64) -> Self {
        Self {
            id,
            physical_asset: payload.physical_asset,
            tracer: payload.tracer,
            validation: payload.validation,
            compliance: payload.compliance,
            created_by: creator.address.to_string(),
            created_by_name: creator.username.to_string(),
            created_by_role: creator.role,
            created_at,
            status: BatchStatus::Pending,
            approved_by: String::new(),
            approved_by_name: String::new(),
            approved_at: 0,
            rejection_reason: String::new(),
            certified_by: String::new(),
            certified_by_name: String::new(),
            certified_at: 0,
            certification_hash: String::new(),
        }
    }

    fn ensure_transition(&self, next: BatchStatus) -> Result<(), BatchError> {
        if self.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(BatchError::InvalidTransition {
                from: self.status,
                to: next,
            })
        }
    }

    fn ensure_reviewer(&self, reviewer: &Reviewer<'_>, action: &'static str) -> Result<(), BatchError> {
        if !reviewer.role.can_review() {
            return Err(BatchError::NotPermitted {
                action,
                role: reviewer.role,
            });
        }
        if reviewer.username == self.created_by_name {
            return Err(BatchError::SelfReview);
        }
        Ok(())
    }

    /// Approves a pending batch.
    pub fn approve(&mut self, reviewer: &Reviewer<'_>, now: i64) -> Result<(), BatchError> {
        self.ensure_transition(BatchStatus::Approved)?;
        self.ensure_reviewer(reviewer, "approve")?;

        self.status = BatchStatus::Approved;
        self.approved_by = reviewer.address.to_string();
        self.approved_by_name = reviewer.username.to_string();
        self.approved_at = now;
        Ok(())
    }

    /// Rejects a pending batch. The reviewer is recorded in the approval
    /// audit fields.
    pub fn reject(
        &mut self,
        reviewer: &Reviewer<'_>,
        reason: &str,
        now: i64,
    ) -> Result<(), BatchError> {
        self.ensure_transition(BatchStatus::Rejected)?;
        self.ensure_reviewer(reviewer, "reject")?;

        let reason = reason.trim();
        self.status = BatchStatus::Rejected;
        self.approved_by = reviewer.address.to_string();
        self.approved_by_name = reviewer.username.to_string();
        self.approved_at = now;
        self.rejection_reason = if reason.is_empty() {
            DEFAULT_REJECTION_REASON.to_string()
        } else {
            reason.to_string()
        };
        Ok(())
    }

    /// Certifies an approved batch.
    pub fn certify(
        &mut self,
        certifier: &Reviewer<'_>,
        certification_hash: &str,
        now: i64,
    ) -> Result<(), BatchError> {
        self.ensure_transition(BatchStatus::Certified)?;
        if !certifier.role.can_certify() {
            return Err(BatchError::NotPermitted {
                action: "certify",
                role: certifier.role,
            });
        }

        self.status = BatchStatus::Certified;
        self.certified_by = certifier.address.to_string();
        self.certified_by_name = certifier.username.to_string();
        self.certified_at = now;
        self.certification_hash = certification_hash.trim().to_string();
        Ok(())
    }

    /// Case-insensitive match against the searchable fields.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        [
            &self.physical_asset.asset_id,
            &self.physical_asset.material,
            &self.physical_asset.batch_number,
            &self.tracer.supplier,
            &self.tracer.country,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&term))
    }
}

// ============================================================================
// Querying
// ============================================================================

/// Ordering for batch listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchSort {
    /// Keep ledger order.
    #[default]
    Ledger,
    Newest,
    Oldest,
    Status,
    AssetId,
}

impl BatchSort {
    /// Parses a sort key; unknown keys keep ledger order.
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "newest" => BatchSort::Newest,
            "oldest" => BatchSort::Oldest,
            "status" => BatchSort::Status,
            "assetId" | "asset_id" => BatchSort::AssetId,
            _ => BatchSort::Ledger,
        }
    }
}

/// Filter and ordering applied to a batch listing.
#[derive(Debug, Clone, Default)]
pub struct BatchQuery {
    pub search: Option<String>,
    pub status: Option<BatchStatus>,
    pub sort: BatchSort,
}

impl BatchQuery {
    /// Applies the query to a listing.
    pub fn apply(&self, batches: Vec<Batch>) -> Vec<Batch> {
        let mut selected: Vec<Batch> = batches
            .into_iter()
            .filter(|b| self.status.map(|s| b.status == s).unwrap_or(true))
            .filter(|b| {
                self.search
                    .as_deref()
                    .map(|term| b.matches_search(term))
                    .unwrap_or(true)
            })
            .collect();

        match self.sort {
            BatchSort::Ledger => {}
            BatchSort::Newest => selected.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            BatchSort::Oldest => selected.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            BatchSort::Status => selected.sort_by(|a, b| a.status.cmp(&b.status)),
            BatchSort::AssetId => selected.sort_by(|a, b| {
                match a
                    .physical_asset
                    .asset_id
                    .to_lowercase()
                    .cmp(&b.physical_asset.asset_id.to_lowercase())
                {
                    Ordering::Equal => a.id.cmp(&b.id),
                    other => other,
                }
            }),
        }

        selected
    }
}
