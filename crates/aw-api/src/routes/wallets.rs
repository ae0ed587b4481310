//! Wallet balance endpoints.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::auth::CurrentUser;
use crate::dto::WalletBalanceResponse;
use crate::error::{ApiError, ErrorResponse};
use crate::state::AppState;

/// Creates wallet routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/wallet/balance", get(my_balance))
        .route("/wallets/:username/balance", get(user_balance))
}

/// Token balances of the logged-in user.
#[utoipa::path(
    get,
    path = "/api/wallet/balance",
    responses(
        (status = 200, description = "Wallet balances", body = WalletBalanceResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse)
    ),
    tag = "Wallets"
)]
pub async fn my_balance(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<WalletBalanceResponse>, ApiError> {
    // The wallet is created at login, so a missing one is a server fault.
    let wallet = state
        .wallets
        .balance(&user.username)
        .await
        .ok_or_else(|| ApiError::Internal("Wallet not found".to_string()))?;

    Ok(Json(WalletBalanceResponse {
        success: true,
        wallet,
    }))
}

/// Token balances of a named user. Admins may read anyone's.
#[utoipa::path(
    get,
    path = "/api/wallets/{username}/balance",
    params(("username" = String, Path, description = "Wallet owner")),
    responses(
        (status = 200, description = "Wallet balances", body = WalletBalanceResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 403, description = "Another user's wallet", body = ErrorResponse),
        (status = 404, description = "No wallet for this user", body = ErrorResponse)
    ),
    tag = "Wallets"
)]
pub async fn user_balance(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(username): Path<String>,
) -> Result<Json<WalletBalanceResponse>, ApiError> {
    if !current.can_view(&username) {
        return Err(ApiError::Forbidden(
            "Cannot view another user's wallet".to_string(),
        ));
    }

    let wallet = state
        .wallets
        .balance(&username)
        .await
        .ok_or_else(|| ApiError::NotFound("Wallet not found".to_string()))?;

    Ok(Json(WalletBalanceResponse {
        success: true,
        wallet,
    }))
}
