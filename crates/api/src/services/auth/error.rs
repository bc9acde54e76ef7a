//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong password or unknown username.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The account exists but was disabled by staff.
    #[error("account is disabled")]
    InactiveAccount,

    /// Username already taken.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// A profile field failed validation.
    #[error("invalid field: {0}")]
    InvalidField(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
