//! Authentication service.
//!
//! Password registration and login backed by bcrypt, plus access-token
//! issuance and verification.

mod error;
mod jwt;

pub use error::AuthError;
pub use jwt::{Claims, JwtKeys};

use fk_designers_core::{Email, Phone, Role};
use tracing::instrument;

use crate::db::{Database, RepositoryError, UserRepository};
use crate::models::{CustomerProfile, NewUser, UserRecord};

/// bcrypt work factor for stored passwords.
pub const BCRYPT_COST: u32 = 12;

/// Validated registration input.
#[derive(Debug, Clone)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: Phone,
    pub password: String,
    pub profile: CustomerProfile,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    cost: u32,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self {
            users: UserRepository::new(db),
            cost: BCRYPT_COST,
        }
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Register a customer account.
    ///
    /// The account and its customer row are written in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::EmailTaken` if the email is already registered,
    /// including when a concurrent registration wins the race.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: Registration) -> Result<UserRecord, AuthError> {
        if self.users.find_by_email(&registration.email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = hash_password(registration.password, self.cost).await?;
        let user = NewUser {
            first_name: registration.first_name,
            last_name: registration.last_name,
            email: registration.email,
            phone: registration.phone,
            password_hash,
            role: Role::Customer,
        };

        self.users
            .create_customer(&user, &registration.profile)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::Repository(other),
            })
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email is unknown or the
    /// password is wrong, and `AuthError::AccountInactive` for a deactivated
    /// account.
    #[instrument(skip(self, email, password), fields(email = %email))]
    pub async fn login(&self, email: &Email, password: &str) -> Result<UserRecord, AuthError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AuthError::AccountInactive);
        }

        if !verify_password(password.to_string(), user.password_hash.clone()).await? {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }
}

// =============================================================================
// Password Hashing
// =============================================================================

/// Hash a password with bcrypt on the blocking pool.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub async fn hash_password(password: String, cost: u32) -> Result<String, AuthError> {
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hash)
}

/// Check a password against a stored bcrypt hash on the blocking pool.
///
/// A malformed stored hash counts as a mismatch.
///
/// # Errors
///
/// Returns `AuthError::Blocking` if the task fails.
pub async fn verify_password(password: String, hash: String) -> Result<bool, AuthError> {
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await?;
    Ok(verified.unwrap_or_else(|err| {
        tracing::warn!(error = %err, "Stored password hash could not be read");
        false
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hash = hash_password("kurta-season".to_string(), 4).await.unwrap();
        assert!(hash.starts_with("$2"));
        assert!(verify_password("kurta-season".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password("kurta-seasons".to_string(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_hash_is_a_mismatch() {
        assert!(
            !verify_password("anything".to_string(), "plaintext".to_string())
                .await
                .unwrap()
        );
    }
}
