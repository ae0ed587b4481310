//! Shared connector types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur in connectors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConnectorError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Authorization denied: {0}")]
    AuthorizationDenied(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limited: retry after {0} seconds")]
    RateLimited(u64),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The remote rejected the request as conflicting with its state (409).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The remote understood the request but refused to apply it (422).
    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConnectorError {
    /// Whether the remote could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            ConnectorError::ConnectionFailed(_) | ConnectorError::Timeout(_)
        )
    }
}

/// Result type for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// Health status of a connector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorHealth {
    Healthy,
    Degraded(String),
    Unhealthy(String),
}

impl ConnectorHealth {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectorHealth::Healthy => "healthy",
            ConnectorHealth::Degraded(_) => "degraded",
            ConnectorHealth::Unhealthy(_) => "unhealthy",
        }
    }

    /// Detail for degraded or unhealthy states.
    pub fn message(&self) -> Option<&str> {
        match self {
            ConnectorHealth::Healthy => None,
            ConnectorHealth::Degraded(msg) | ConnectorHealth::Unhealthy(msg) => Some(msg),
        }
    }
}

/// Configuration for an outbound connector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// Connector name, used in logs.
    pub name: String,
    pub base_url: String,
    #[serde(default)]
    pub auth: AuthConfig,
    pub timeout_secs: u64,
    /// Retries after the first attempt for idempotent calls.
    pub max_retries: u32,
    /// Additional headers sent with every request.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl ConnectorConfig {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            auth: AuthConfig::None,
            timeout_secs: 30,
            max_retries: 3,
            headers: HashMap::new(),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    #[default]
    None,
    BearerToken { token: String },
}
