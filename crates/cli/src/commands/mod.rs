//! Subcommand implementations.

pub mod admin;
pub mod migrate;

use fk_designers_api::config::{ConfigError, DatabaseConfig};
use fk_designers_api::db::Database;

/// Pool for a one-shot command, configured like the server's.
fn connect() -> Result<Database, ConnectError> {
    dotenvy::dotenv().ok();
    let mut config = DatabaseConfig::from_env()?;
    // A CLI run needs a single connection; don't pre-open the server minimum.
    config.min_connections = 0;
    config.max_connections = config.max_connections.min(2);
    Ok(Database::connect_lazy(&config)?)
}

/// Failure to build a pool from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid database settings: {0}")]
    Database(#[from] sqlx::Error),
}
