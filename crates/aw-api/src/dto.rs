//! Data Transfer Objects (DTOs) for API requests and responses.
//!
//! Field names are camelCase on the wire to match the browser client.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use aw_core::{Batch, Record, Role, SessionUser, WalletBalance};

// ============================================================================
// Auth DTOs
// ============================================================================

/// A role given either as its ledger code or its label.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RoleInput {
    Code(u8),
    Label(String),
}

impl RoleInput {
    pub fn into_role(self) -> Result<Role, String> {
        match self {
            RoleInput::Code(code) => Role::try_from(code),
            RoleInput::Label(label) => label.parse(),
        }
    }
}

/// Registration request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 64, message = "Username is required"))]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    /// Role code (0-4) or label.
    #[schema(value_type = Option<String>)]
    pub role: Option<RoleInput>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
    /// Address of the wallet created for the new account.
    pub address: String,
}

/// Login request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Username and password are required"))]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Username and password are required"))]
    pub password: String,
}

/// The logged-in user as returned to the client.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub username: String,
    pub address: String,
    /// Ledger role code.
    #[schema(value_type = u8)]
    pub role: Role,
    pub role_name: String,
}

impl From<&SessionUser> for UserInfo {
    fn from(user: &SessionUser) -> Self {
        Self {
            username: user.username.clone(),
            address: user.address.clone(),
            role: user.role,
            role_name: user.role.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub success: bool,
    pub user: UserInfo,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
}

/// Generic acknowledgement.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SuccessResponse {
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }
}

// ============================================================================
// Batch DTOs
// ============================================================================

/// Query parameters for listing batches.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BatchListQuery {
    /// Case-insensitive match on asset id, material, batch number, supplier or country.
    pub search: Option<String>,
    /// Status code or label; `all` disables the filter.
    pub status: Option<String>,
    /// `newest`, `oldest`, `status` or `assetId`.
    pub sort: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBatchResponse {
    pub success: bool,
    pub batch_id: u64,
    pub transaction_hash: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BatchListResponse {
    pub success: bool,
    pub count: usize,
    #[schema(value_type = Vec<Object>)]
    pub batches: Vec<Batch>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BatchResponse {
    pub success: bool,
    #[schema(value_type = Object)]
    pub batch: Batch,
}

/// Outcome of a lifecycle transaction.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub success: bool,
    pub transaction_hash: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RejectRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CertifyRequest {
    pub certification_hash: Option<String>,
}

// ============================================================================
// Submission DTOs
// ============================================================================

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmissionSavedResponse {
    pub success: bool,
    pub id: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmissionListResponse {
    pub success: bool,
    pub count: usize,
    /// Rows of the submissions sheet keyed by column header.
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<Record>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmissionResponse {
    pub success: bool,
    #[schema(value_type = Object)]
    pub data: Record,
}

// ============================================================================
// Wallet DTOs
// ============================================================================

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WalletBalanceResponse {
    pub success: bool,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub wallet: WalletBalance,
}

// ============================================================================
// AI proxy DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub content: String,
}

/// Chat-completion shaped request; only the first message is used.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PredictRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

impl PredictRequest {
    pub fn prompt(&self) -> &str {
        self.messages
            .first()
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PredictChoice {
    pub message: ChatMessage,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PredictResponse {
    pub choices: Vec<PredictChoice>,
}

// ============================================================================
// Info & Health DTOs
// ============================================================================

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeatureInfo {
    pub ledger: bool,
    pub text_generation: bool,
    pub authentication: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LedgerInfo {
    pub ready: bool,
    pub backend: String,
    pub contract_address: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InfoResponse {
    pub message: String,
    pub version: String,
    pub status: String,
    pub features: FeatureInfo,
    pub ledger: LedgerInfo,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TextGenerationHealth {
    pub model: String,
    /// `healthy`, `degraded` or `unhealthy`.
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `healthy` or `degraded`.
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub ledger: LedgerInfo,
    /// Present when a text generator is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_generation: Option<TextGenerationHealth>,
}
