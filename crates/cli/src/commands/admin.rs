//! Staff and admin account management.
//!
//! # Environment Variables
//!
//! - `FKD_ADMIN_PASSWORD` - password for `admin create` (kept off the
//!   command line so it stays out of shell history)

use fk_designers_api::db::{RepositoryError, UserRepository};
use fk_designers_api::models::{NewUser, StaffProfile};
use fk_designers_api::services::auth::{AuthError, BCRYPT_COST, hash_password};
use fk_designers_core::{Email, Phone, Role};
use thiserror::Error;

use super::ConnectError;

const PASSWORD_ENV: &str = "FKD_ADMIN_PASSWORD";
const MIN_PASSWORD_LENGTH: usize = 6;

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Hashing failed.
    #[error("Password hashing failed: {0}")]
    Auth(#[from] AuthError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: staff, admin")]
    InvalidRole(String),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Invalid phone number.
    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),

    /// Password too short.
    #[error("{PASSWORD_ENV} must be at least {MIN_PASSWORD_LENGTH} characters")]
    WeakPassword,

    /// No account with that email.
    #[error("No user with email: {0}")]
    UnknownUser(String),
}

/// Arguments of `admin create`.
#[derive(Debug)]
pub struct NewStaffArgs {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub role: String,
    pub position: String,
    pub department: String,
}

/// Validated form of [`NewStaffArgs`], password not yet hashed.
#[derive(Debug)]
struct StaffAccount {
    email: Email,
    phone: Phone,
    role: Role,
}

fn validate(args: &NewStaffArgs) -> Result<StaffAccount, AdminError> {
    let role = match args.role.parse::<Role>() {
        Ok(role @ (Role::Staff | Role::Admin)) => role,
        _ => return Err(AdminError::InvalidRole(args.role.clone())),
    };
    let email =
        Email::parse(&args.email).map_err(|_| AdminError::InvalidEmail(args.email.clone()))?;
    let phone =
        Phone::parse(&args.phone).map_err(|_| AdminError::InvalidPhone(args.phone.clone()))?;
    Ok(StaffAccount { email, phone, role })
}

fn password_from(value: Option<String>) -> Result<String, AdminError> {
    let password = value.ok_or(AdminError::MissingEnvVar(PASSWORD_ENV))?;
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AdminError::WeakPassword);
    }
    Ok(password)
}

/// Create a staff or admin account with its staff record.
///
/// # Errors
///
/// Returns an error if an argument is invalid, the password variable is
/// unset, or the email is already registered.
pub async fn create_user(args: &NewStaffArgs) -> Result<(), AdminError> {
    let account = validate(args)?;
    let db = super::connect()?;
    let password = password_from(std::env::var(PASSWORD_ENV).ok())?;

    tracing::info!("Creating {} account: {}", account.role, account.email);
    let password_hash = hash_password(password, BCRYPT_COST).await?;

    let user = UserRepository::new(&db)
        .create_staff(
            &NewUser {
                first_name: args.first_name.trim().to_string(),
                last_name: args.last_name.trim().to_string(),
                email: account.email,
                phone: account.phone,
                password_hash,
                role: account.role,
            },
            &StaffProfile {
                position: args.position.clone(),
                department: args.department.clone(),
                start_date: chrono::Utc::now().date_naive(),
            },
        )
        .await?;

    tracing::info!(
        "Account created successfully! ID: {}, Email: {}, Role: {}",
        user.user_id,
        user.email,
        user.role
    );
    Ok(())
}

/// Activate or deactivate the account registered under `email`.
///
/// # Errors
///
/// Returns an error if the email is invalid or unknown, or the update fails.
pub async fn set_active(email: &str, active: bool) -> Result<(), AdminError> {
    let email = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;
    let db = super::connect()?;

    let user = UserRepository::new(&db)
        .set_active_by_email(&email, active)
        .await?
        .ok_or_else(|| AdminError::UnknownUser(email.to_string()))?;

    let status = if user.is_active { "active" } else { "inactive" };
    tracing::info!("{} ({}) is now {}", user.email, user.role, status);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn args(role: &str) -> NewStaffArgs {
        NewStaffArgs {
            email: "Ops@FKDesigner.in".to_string(),
            first_name: "Asha".to_string(),
            last_name: "Rao".to_string(),
            phone: "9820012345".to_string(),
            role: role.to_string(),
            position: "Tailor".to_string(),
            department: "Workshop".to_string(),
        }
    }

    #[test]
    fn test_validate_accepts_staff_and_admin() {
        assert_eq!(validate(&args("staff")).unwrap().role, Role::Staff);
        let admin = validate(&args("admin")).unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.email.as_str(), "ops@fkdesigner.in");
    }

    #[test]
    fn test_validate_rejects_customer_role() {
        assert!(matches!(
            validate(&args("customer")),
            Err(AdminError::InvalidRole(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_phone() {
        let mut bad = args("staff");
        bad.phone = "12-ab".to_string();
        assert!(matches!(validate(&bad), Err(AdminError::InvalidPhone(_))));
    }

    #[test]
    fn test_password_rules() {
        assert!(matches!(
            password_from(None),
            Err(AdminError::MissingEnvVar(PASSWORD_ENV))
        ));
        assert!(matches!(
            password_from(Some("abc".to_string())),
            Err(AdminError::WeakPassword)
        ));
        assert_eq!(password_from(Some("s3cret!".to_string())).unwrap(), "s3cret!");
    }
}
