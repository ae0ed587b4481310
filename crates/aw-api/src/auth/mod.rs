//! Session-based authentication.
//!
//! A successful login stores a [`SessionUser`] under [`SESSION_USER_KEY`];
//! the extractors in [`extractors`] read it back on later requests.

pub mod extractors;

pub use extractors::{CurrentUser, OptionalUser};

use aw_core::SessionUser;
use tower_sessions::Session;

/// Session key for storing user data.
pub const SESSION_USER_KEY: &str = "user";

/// Name of the session cookie.
pub const SESSION_COOKIE_NAME: &str = "aware_session";

/// Gets the logged-in user from the session.
pub async fn get_session_user(session: &Session) -> Option<SessionUser> {
    session
        .get::<SessionUser>(SESSION_USER_KEY)
        .await
        .ok()
        .flatten()
}

/// Stores the logged-in user in the session.
pub async fn set_session_user(
    session: &Session,
    user: &SessionUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(SESSION_USER_KEY, user).await
}

/// Clears the session (logout).
pub async fn clear_session(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
