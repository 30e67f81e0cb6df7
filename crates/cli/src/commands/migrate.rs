//! Database migration command.
//!
//! Migrations live in `crates/api/migrations/` and are embedded into the
//! binary at compile time.

use thiserror::Error;

use super::ConnectError;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply every pending migration.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let db = super::connect()?;

    let migrator = sqlx::migrate!("../api/migrations");
    tracing::info!(available = migrator.iter().count(), "Running migrations...");
    migrator.run(db.pool()).await?;

    tracing::info!("Migrations complete!");
    db.pool().close().await;
    Ok(())
}
