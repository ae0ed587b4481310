//! Roles, accounts and session identities.
//!
//! Roles mirror the supply-chain parties registered on the ledger. Their
//! numeric codes are part of the wire format and must not change.

pub mod password;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supply-chain role of a registered account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Role {
    /// Produces raw material and submits batches.
    Producer,
    /// Processes material into goods.
    Manufacturer,
    /// Moves goods between parties.
    Distributor,
    /// Issues certifications for approved batches.
    Certifier,
    /// Platform administrator.
    Admin,
}

impl Role {
    /// Returns the numeric code used by the ledger.
    pub fn code(&self) -> u8 {
        match self {
            Role::Producer => 0,
            Role::Manufacturer => 1,
            Role::Distributor => 2,
            Role::Certifier => 3,
            Role::Admin => 4,
        }
    }

    /// Resolves a numeric ledger code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Role::Producer),
            1 => Some(Role::Manufacturer),
            2 => Some(Role::Distributor),
            3 => Some(Role::Certifier),
            4 => Some(Role::Admin),
            _ => None,
        }
    }

    /// Returns the display label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Producer => "Producer",
            Role::Manufacturer => "Manufacturer",
            Role::Distributor => "Distributor",
            Role::Certifier => "Certifier",
            Role::Admin => "Admin",
        }
    }

    /// Returns all roles in code order.
    pub fn all() -> &'static [Role] {
        &[
            Role::Producer,
            Role::Manufacturer,
            Role::Distributor,
            Role::Certifier,
            Role::Admin,
        ]
    }

    /// Every registered party may record a batch.
    pub fn can_create_batch(&self) -> bool {
        true
    }

    /// Whether this role may approve or reject a pending batch.
    pub fn can_review(&self) -> bool {
        !matches!(self, Role::Producer)
    }

    /// Whether this role may certify an approved batch.
    pub fn can_certify(&self) -> bool {
        matches!(self, Role::Certifier | Role::Admin)
    }
}

impl From<Role> for u8 {
    fn from(role: Role) -> Self {
        role.code()
    }
}

impl TryFrom<u8> for Role {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Role::from_code(code).ok_or_else(|| format!("Unknown role code: {}", code))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    /// Accepts either the numeric code or the case-insensitive label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(code) = trimmed.parse::<u8>() {
            return Role::try_from(code);
        }
        Role::all()
            .iter()
            .copied()
            .find(|role| role.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("Unknown role: {}", s))
    }
}

/// An account registered on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Unique login name.
    pub username: String,
    /// Address the account was registered from.
    pub address: String,
    /// Supply-chain role.
    pub role: Role,
    /// When the account was registered.
    pub registered_at: DateTime<Utc>,
}

impl Account {
    /// Creates a new account registered now.
    pub fn new(username: impl Into<String>, address: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            address: address.into(),
            role,
            registered_at: Utc::now(),
        }
    }
}

/// Identity kept in the HTTP session after a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// Login name.
    pub username: String,
    /// Address of the user's server-side wallet.
    pub address: String,
    /// Supply-chain role as returned by the ledger.
    pub role: Role,
}
