//! Startup task that guarantees the configured admin account exists.

use std::time::Duration;

use chrono::Utc;
use secrecy::ExposeSecret;
use tokio::task::JoinHandle;

use fk_designers_core::Role;

use super::auth::{AuthError, BCRYPT_COST, hash_password};
use crate::config::AdminBootstrapConfig;
use crate::db::{Database, UserRepository};
use crate::models::{NewUser, StaffProfile};

const INITIAL_DELAY: Duration = Duration::from_secs(5);
const RETRY_INTERVAL: Duration = Duration::from_secs(30);

/// Spawn the bootstrap: wait [`INITIAL_DELAY`], then retry every
/// [`RETRY_INTERVAL`] until the admin has been written once.
#[must_use]
pub fn spawn_admin_bootstrap(db: Database, config: AdminBootstrapConfig) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(INITIAL_DELAY).await;
        loop {
            match ensure_admin(&db, &config).await {
                Ok(()) => break,
                Err(err) => {
                    tracing::error!(
                        error = %err,
                        retry_in_secs = RETRY_INTERVAL.as_secs(),
                        "Admin bootstrap failed"
                    );
                    tokio::time::sleep(RETRY_INTERVAL).await;
                }
            }
        }
    })
}

/// Create the admin account, or reset an existing account with that email
/// to an active admin with the configured password.
///
/// # Errors
///
/// Returns `AuthError` if hashing or the database write fails.
pub async fn ensure_admin(db: &Database, config: &AdminBootstrapConfig) -> Result<(), AuthError> {
    let password_hash =
        hash_password(config.password.expose_secret().to_string(), BCRYPT_COST).await?;

    let user = NewUser {
        first_name: "FK".to_string(),
        last_name: "Designer".to_string(),
        email: config.email.clone(),
        phone: config.phone.clone(),
        password_hash,
        role: Role::Admin,
    };
    let staff = StaffProfile {
        position: "System Administrator".to_string(),
        department: "Management".to_string(),
        start_date: Utc::now().date_naive(),
    };

    let (record, created) = UserRepository::new(db).ensure_admin(&user, &staff).await?;
    if created {
        tracing::info!(user_id = %record.user_id, email = %record.email, "Admin user created");
    } else {
        tracing::info!(user_id = %record.user_id, email = %record.email, "Admin user updated");
    }
    Ok(())
}
