//! API error types and handling.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

use aw_connectors::ConnectorError;
use aw_core::{BatchError, LedgerError, StorageError};

/// API error type.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Bad request (malformed or incomplete input).
    #[error("{0}")]
    BadRequest(String),

    /// No logged-in user.
    #[error("{0}")]
    Unauthorized(String),

    /// Logged in but not allowed.
    #[error("{0}")]
    Forbidden(String),

    /// Conflicts with current state (duplicate, wrong lifecycle state).
    #[error("{0}")]
    Conflict(String),

    /// Request DTO failed field validation.
    #[error("Validation failed")]
    ValidationError(ValidationErrorDetails),

    /// A submission failed the form rules.
    #[error("Validation failed")]
    InvalidSubmission(Vec<String>),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Internal(String),

    /// A dependency (ledger, text generator) cannot be reached.
    #[error("{0}")]
    ServiceUnavailable(String),
}

/// Details for field-level validation errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetails {
    pub message: String,
    pub fields: HashMap<String, Vec<FieldError>>,
}

/// A single field validation error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldError {
    /// Error code (e.g. "required", "length").
    pub code: String,
    pub message: String,
}

impl ValidationErrorDetails {
    /// Creates a validation error from multiple field errors.
    pub fn from_fields(fields: HashMap<String, Vec<FieldError>>) -> Self {
        let mut messages: Vec<&str> = fields
            .values()
            .flatten()
            .map(|e| e.message.as_str())
            .collect();
        messages.sort_unstable();
        messages.dedup();
        let message = if messages.is_empty() {
            "Validation failed".to_string()
        } else {
            messages.join("; ")
        };
        Self { message, fields }
    }
}

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Always `false`.
    pub success: bool,
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidSubmission(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Returns the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::InvalidSubmission(_) => "VALIDATION_ERROR",
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::Internal(_) => "INTERNAL_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    pub fn not_logged_in() -> Self {
        ApiError::Unauthorized("Not logged in".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (message, details) = match &self {
            ApiError::ValidationError(details) => (
                details.message.clone(),
                Some(serde_json::json!({ "fields": details.fields })),
            ),
            ApiError::InvalidSubmission(errors) => (
                self.to_string(),
                Some(serde_json::json!({ "errors": errors })),
            ),
            _ => (self.to_string(), None),
        };

        if status.is_server_error() {
            error!(code = self.error_code(), message = %message, "Request failed");
        }

        let body = ErrorResponse {
            success: false,
            code: self.error_code().to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<BatchError> for ApiError {
    fn from(err: BatchError) -> Self {
        match err {
            BatchError::InvalidTransition { .. } | BatchError::SelfReview => {
                ApiError::Conflict(err.to_string())
            }
            BatchError::NotPermitted { .. } => ApiError::Forbidden(err.to_string()),
            BatchError::MissingField(_) => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotReady => ApiError::ServiceUnavailable(err.to_string()),
            LedgerError::BatchNotFound(_) => ApiError::NotFound("Batch not found".to_string()),
            LedgerError::UnknownAccount(_) => ApiError::Forbidden(err.to_string()),
            LedgerError::DuplicateAccount(_) => {
                ApiError::Conflict("Username already exists".to_string())
            }
            LedgerError::Lifecycle(inner) => inner.into(),
            LedgerError::Reverted(msg) => ApiError::Conflict(msg),
            LedgerError::Transport(_) | LedgerError::InvalidResponse(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) => ApiError::NotFound("Submission not found".to_string()),
            StorageError::Duplicate(_) => ApiError::Conflict(err.to_string()),
            err => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<ConnectorError> for ApiError {
    fn from(err: ConnectorError) -> Self {
        if err.is_unreachable() {
            ApiError::ServiceUnavailable(format!("Text generation unavailable: {}", err))
        } else {
            ApiError::Internal(err.to_string())
        }
    }
}

impl From<tower_sessions::session::Error> for ApiError {
    fn from(err: tower_sessions::session::Error) -> Self {
        ApiError::Internal(format!("Session error: {}", err))
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("Background task failed: {}", err))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut fields: HashMap<String, Vec<FieldError>> = HashMap::new();

        for (field_name, field_errors) in err.field_errors() {
            let errors: Vec<FieldError> = field_errors
                .iter()
                .map(|e| {
                    let code = e.code.to_string();
                    let message = e.message.clone().map(|m| m.to_string()).unwrap_or_else(|| {
                        format!("Field '{}' failed validation: {}", field_name, code)
                    });
                    FieldError { code, message }
                })
                .collect();
            fields.insert(field_name.to_string(), errors);
        }

        ApiError::ValidationError(ValidationErrorDetails::from_fields(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aw_core::{BatchStatus, Role};

    async fn body_json(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let (status, body) = body_json(ApiError::not_logged_in()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "UNAUTHORIZED");
        assert_eq!(body["message"], "Not logged in");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_invalid_submission_lists_errors() {
        let error = ApiError::InvalidSubmission(vec!["Date is required".to_string()]);
        let (status, body) = body_json(error).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["errors"][0], "Date is required");
    }

    #[test]
    fn test_ledger_error_mapping() {
        let cases = [
            (LedgerError::NotReady, StatusCode::SERVICE_UNAVAILABLE),
            (LedgerError::BatchNotFound(9), StatusCode::NOT_FOUND),
            (
                LedgerError::DuplicateAccount("a".into()),
                StatusCode::CONFLICT,
            ),
            (
                LedgerError::Lifecycle(BatchError::InvalidTransition {
                    from: BatchStatus::Rejected,
                    to: BatchStatus::Approved,
                }),
                StatusCode::CONFLICT,
            ),
            (
                LedgerError::Lifecycle(BatchError::SelfReview),
                StatusCode::CONFLICT,
            ),
            (
                LedgerError::Lifecycle(BatchError::NotPermitted {
                    action: "certify",
                    role: Role::Producer,
                }),
                StatusCode::FORBIDDEN,
            ),
            (LedgerError::Reverted("nope".into()), StatusCode::CONFLICT),
            (
                LedgerError::Transport("reset".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status_code(), expected);
        }
    }

    #[test]
    fn test_connector_error_mapping() {
        let unreachable = ConnectorError::ConnectionFailed("refused".into());
        assert_eq!(
            ApiError::from(unreachable).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );

        let failed = ConnectorError::RequestFailed("model missing".into());
        assert_eq!(
            ApiError::from(failed).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_storage_not_found_maps_to_404() {
        let err = StorageError::NotFound("SUB-1".into());
        assert_eq!(ApiError::from(err).status_code(), StatusCode::NOT_FOUND);
    }
}
