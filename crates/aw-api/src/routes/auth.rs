//! Authentication routes: register, login, logout and session lookup.

use axum::{extract::State, routing::get, routing::post, Json, Router};
use tower_sessions::Session;
use tracing::{info, warn};
use validator::Validate;

use aw_core::{validate_password_strength, SessionUser};

use crate::auth::{clear_session, set_session_user, OptionalUser};
use crate::dto::{
    LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, SessionResponse,
    SuccessResponse, UserInfo,
};
use crate::error::{ApiError, ErrorResponse};
use crate::extract::ApiJson;
use crate::state::AppState;

/// Creates the auth routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/session", get(session_info))
}

/// Registers an account on the ledger and creates its wallet.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account registered", body = RegisterResponse),
        (status = 400, description = "Missing fields or weak password", body = ErrorResponse),
        (status = 409, description = "Username already exists", body = ErrorResponse),
        (status = 503, description = "Ledger not ready", body = ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    request.validate()?;

    let username = request.username.trim().to_string();
    if username.is_empty() {
        return Err(ApiError::BadRequest("Username is required".to_string()));
    }
    let role = request
        .role
        .ok_or_else(|| ApiError::BadRequest("Role is required".to_string()))?
        .into_role()
        .map_err(ApiError::BadRequest)?;

    let weaknesses = validate_password_strength(&request.password);
    if !weaknesses.is_empty() {
        return Err(ApiError::BadRequest(weaknesses.join("; ")));
    }

    let ledger = state.ready_ledger().await?;
    if ledger.get_account(&username).await?.is_some() {
        return Err(ApiError::Conflict("Username already exists".to_string()));
    }

    let (wallet, _) = state.wallets.get_or_create(&username).await;
    let receipt = ledger
        .register_user(&username, &request.password, role, &wallet.address)
        .await?;

    info!(
        username = %username,
        role = %role,
        tx = %receipt.transaction_hash,
        "Account registered"
    );

    Ok(Json(RegisterResponse {
        success: true,
        message: "User registered successfully".to_string(),
        address: wallet.address,
    }))
}

/// Verifies credentials against the ledger and starts a session.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Missing credentials", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 503, description = "Ledger not ready", body = ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    request.validate()?;

    let ledger = state.ready_ledger().await?;
    let Some(account) = ledger
        .verify_login(&request.username, &request.password)
        .await?
    else {
        warn!(username = %request.username, "Login failed");
        return Err(ApiError::InvalidCredentials);
    };

    let (_, created) = state.wallets.get_or_create(&account.username).await;
    if created {
        // A fresh wallet starts empty; rebuild it from the ledger.
        match ledger.list_batches().await {
            Ok(batches) => {
                state.wallets.resync(&account.username, &batches).await;
            }
            Err(e) => warn!(username = %account.username, error = %e, "Wallet resync failed"),
        }
    }

    // Prevent session fixation.
    session.cycle_id().await?;

    let user = SessionUser {
        username: account.username,
        address: account.address,
        role: account.role,
    };
    set_session_user(&session, &user).await?;

    info!(username = %user.username, role = %user.role, "User logged in");

    Ok(Json(LoginResponse {
        success: true,
        user: UserInfo::from(&user),
    }))
}

/// Ends the current session.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = SuccessResponse)
    ),
    tag = "Auth"
)]
pub async fn logout(
    OptionalUser(user): OptionalUser,
    session: Session,
) -> Result<Json<SuccessResponse>, ApiError> {
    clear_session(&session).await?;

    if let Some(user) = user {
        info!(username = %user.username, "User logged out");
    }

    Ok(Json(SuccessResponse::with_message("Logged out")))
}

/// Reports whether the caller is logged in.
#[utoipa::path(
    get,
    path = "/api/auth/session",
    responses(
        (status = 200, description = "Session state", body = SessionResponse)
    ),
    tag = "Auth"
)]
pub async fn session_info(OptionalUser(user): OptionalUser) -> Json<SessionResponse> {
    Json(SessionResponse {
        logged_in: user.is_some(),
        user: user.as_ref().map(UserInfo::from),
    })
}
