//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong password or unknown email. The two are not distinguished.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The account exists but has been deactivated.
    #[error("account is inactive")]
    AccountInactive,

    /// Registration with an email that is already taken.
    #[error("email already registered")]
    EmailTaken,

    /// No bearer token on a protected request.
    #[error("missing access token")]
    MissingToken,

    /// Token is malformed, tampered with or expired.
    #[error("invalid or expired token")]
    InvalidToken,

    /// Token was valid but its user is gone or inactive.
    #[error("token user not found or inactive")]
    UnknownUser,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    /// Token could not be signed.
    #[error("token encoding error: {0}")]
    TokenEncoding(#[source] jsonwebtoken::errors::Error),

    /// The hashing task panicked or was cancelled.
    #[error("blocking task failed: {0}")]
    Blocking(#[from] tokio::task::JoinError),
}
