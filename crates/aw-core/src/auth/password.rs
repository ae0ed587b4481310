//! Password hashing utilities using Argon2.
//!
//! Account passwords never leave the ledger in clear text; the in-memory
//! ledger stores Argon2id PHC strings produced here.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

/// Minimum accepted password length at registration.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Password hashing errors.
#[derive(Error, Debug)]
pub enum PasswordError {
    /// Error during password hashing.
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Error during password verification.
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format.
    #[error("Invalid password hash format")]
    InvalidHash,
}

/// Hashes a password using Argon2id.
///
/// # Example
///
/// ```
/// use aw_core::auth::password::hash_password;
///
/// let hash = hash_password("test123").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

/// Verifies a password against a stored PHC hash.
///
/// Returns `Ok(false)` for a wrong password and an error only when the
/// stored hash itself is unusable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHash)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(e.to_string())),
    }
}

/// Checks a registration password against the platform policy.
///
/// Returns the list of violated rules, empty if the password is acceptable.
pub fn validate_password_strength(password: &str) -> Vec<&'static str> {
    let mut errors = Vec::new();

    if password.trim().is_empty() {
        errors.push("Password must not be empty");
    } else if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.push("Password must be at least 6 characters long");
    }

    errors
}
