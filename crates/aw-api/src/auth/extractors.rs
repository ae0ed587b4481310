//! Axum extractors for the logged-in user.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;
use tracing::debug;

use aw_core::{Role, SessionUser};

use crate::error::ApiError;

use super::get_session_user;

/// Extractor for handlers that require a logged-in user.
///
/// Rejects with 401 `Not logged in` when the session carries no user.
///
/// # Example
///
/// ```ignore
/// async fn protected(CurrentUser(user): CurrentUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct CurrentUser(pub SessionUser);

impl CurrentUser {
    /// Whether the user may read data belonging to `username`.
    pub fn can_view(&self, username: &str) -> bool {
        self.0.username == username || self.0.role == Role::Admin
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| ApiError::Internal(msg.to_string()))?;

        match get_session_user(&session).await {
            Some(user) => Ok(CurrentUser(user)),
            None => {
                debug!(uri = %parts.uri, "Rejected request without a logged-in user");
                Err(ApiError::not_logged_in())
            }
        }
    }
}

/// Extractor for optional authentication. Never fails.
pub struct OptionalUser(pub Option<SessionUser>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = match Session::from_request_parts(parts, state).await {
            Ok(session) => get_session_user(&session).await,
            Err(_) => None,
        };
        Ok(OptionalUser(user))
    }
}
