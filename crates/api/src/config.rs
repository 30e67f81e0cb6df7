//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string, **or** the discrete
//!   `DB_HOST`, `DB_USER`, `DB_PASSWORD`, `DB_NAME` variables
//! - `JWT_SECRET` - Token signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `DB_PORT` - Database port when using discrete variables (default: 5432)
//! - `DB_SSLMODE` - `disable`, `prefer` or `require` (default: prefer)
//! - `DB_MAX_CONNECTIONS` / `DB_MIN_CONNECTIONS` - Pool bounds (default: 20 / 5)
//! - `DB_QUERY_TIMEOUT_SECS` - Per-statement timeout (default: 30)
//! - `HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Listen port (default: 10000)
//! - `APP_ENV` - `development` or `production` (default: development)
//! - `FRONTEND_URL` - Storefront origin allowed by CORS (default: <https://fkdesigner.in>)
//! - `ADMIN_EMAIL` / `ADMIN_PASSWORD` / `ADMIN_PHONE` - Bootstrap admin account
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate (default: 0.1)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use thiserror::Error;

use fk_designers_core::{Email, Phone};

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const MIN_ADMIN_PASSWORD_LENGTH: usize = 12;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }

    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Where the database lives and how the pool should behave.
#[derive(Clone)]
pub struct DatabaseConfig {
    /// Connection target (URL or discrete parts).
    pub target: DatabaseTarget,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    /// Server-side `statement_timeout` and the client-side query timeout.
    pub query_timeout: Duration,
}

/// Connection target for the database.
#[derive(Clone)]
pub enum DatabaseTarget {
    Url(SecretString),
    Parts {
        host: String,
        port: u16,
        user: String,
        password: SecretString,
        database: String,
        ssl_mode: PgSslMode,
    },
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let target = match &self.target {
            DatabaseTarget::Url(_) => "[REDACTED URL]".to_string(),
            DatabaseTarget::Parts {
                host,
                port,
                user,
                database,
                ..
            } => format!("{user}:[REDACTED]@{host}:{port}/{database}"),
        };
        f.debug_struct("DatabaseConfig")
            .field("target", &target)
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .field("idle_timeout", &self.idle_timeout)
            .field("query_timeout", &self.query_timeout)
            .finish()
    }
}

impl DatabaseConfig {
    /// Builds sqlx connect options for this target.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error::Configuration` if the URL cannot be parsed.
    pub fn connect_options(&self) -> Result<PgConnectOptions, sqlx::Error> {
        let options = match &self.target {
            DatabaseTarget::Url(url) => url.expose_secret().parse::<PgConnectOptions>()?,
            DatabaseTarget::Parts {
                host,
                port,
                user,
                password,
                database,
                ssl_mode,
            } => PgConnectOptions::new()
                .host(host)
                .port(*port)
                .username(user)
                .password(password.expose_secret())
                .database(database)
                .ssl_mode(*ssl_mode),
        };
        Ok(options.application_name("fk-designers-api"))
    }
}

/// Credentials for the administrator account ensured at startup.
#[derive(Clone)]
pub struct AdminBootstrapConfig {
    pub email: Email,
    pub password: SecretString,
    pub phone: Phone,
}

impl std::fmt::Debug for AdminBootstrapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminBootstrapConfig")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("phone", &self.phone)
            .finish()
    }
}

/// API application configuration.
#[derive(Clone)]
pub struct ApiConfig {
    pub database: DatabaseConfig,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    pub environment: Environment,
    /// Storefront origin, added to the CORS allow-list
    pub frontend_url: String,
    /// HMAC secret for access tokens
    pub jwt_secret: SecretString,
    /// Access token lifetime
    pub jwt_ttl: Duration,
    pub admin_bootstrap: Option<AdminBootstrapConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("database", &self.database)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("environment", &self.environment)
            .field("frontend_url", &self.frontend_url)
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_ttl", &self.jwt_ttl)
            .field("admin_bootstrap", &self.admin_bootstrap)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_environment", &self.sentry_environment)
            .finish_non_exhaustive()
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database = DatabaseConfig::from_env()?;
        let host = parse_env("HOST", "0.0.0.0")?;
        let port = parse_env("PORT", "10000")?;
        let environment = match get_env_or_default("APP_ENV", "development").as_str() {
            "production" => Environment::Production,
            "development" | "test" => Environment::Development,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "APP_ENV".to_string(),
                    format!("unknown environment '{other}'"),
                ));
            }
        };
        let frontend_url = get_env_or_default("FRONTEND_URL", "https://fkdesigner.in")
            .trim_end_matches('/')
            .to_string();

        let jwt_secret = get_validated_secret("JWT_SECRET")?;
        validate_secret_length(&jwt_secret, "JWT_SECRET")?;

        let admin_bootstrap = AdminBootstrapConfig::from_env()?;

        Ok(Self {
            database,
            host,
            port,
            environment,
            frontend_url,
            jwt_secret,
            jwt_ttl: Duration::from_secs(24 * 60 * 60),
            admin_bootstrap,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Origins allowed to call the API from a browser.
    #[must_use]
    pub fn allowed_origins(&self) -> Vec<String> {
        let mut origins = vec![
            self.frontend_url.clone(),
            "https://fkdesigner.in".to_string(),
            "https://www.fkdesigner.in".to_string(),
            "http://localhost:3000".to_string(),
            "http://localhost:5173".to_string(),
            "http://127.0.0.1:3000".to_string(),
            "http://127.0.0.1:5173".to_string(),
        ];
        origins.sort();
        origins.dedup();
        origins
    }
}

impl DatabaseConfig {
    /// Load pool settings from `DATABASE_URL` or the discrete `DB_*`
    /// variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let target = if let Some(url) = get_optional_env("DATABASE_URL") {
            DatabaseTarget::Url(SecretString::from(url))
        } else {
            let ssl_mode = get_env_or_default("DB_SSLMODE", "prefer")
                .parse::<PgSslMode>()
                .map_err(|e| ConfigError::InvalidEnvVar("DB_SSLMODE".to_string(), e.to_string()))?;
            DatabaseTarget::Parts {
                host: get_required_env("DB_HOST")?,
                port: parse_env("DB_PORT", "5432")?,
                user: get_required_env("DB_USER")?,
                password: SecretString::from(get_required_env("DB_PASSWORD")?),
                database: get_required_env("DB_NAME")?,
                ssl_mode,
            }
        };

        let max_connections: u32 = parse_env("DB_MAX_CONNECTIONS", "20")?;
        let min_connections: u32 = parse_env("DB_MIN_CONNECTIONS", "5")?;
        if min_connections > max_connections {
            return Err(ConfigError::InvalidEnvVar(
                "DB_MIN_CONNECTIONS".to_string(),
                format!("must not exceed DB_MAX_CONNECTIONS ({max_connections})"),
            ));
        }

        Ok(Self {
            target,
            max_connections,
            min_connections,
            acquire_timeout: Duration::from_secs(20),
            idle_timeout: Duration::from_secs(600),
            query_timeout: Duration::from_secs(parse_env("DB_QUERY_TIMEOUT_SECS", "30")?),
        })
    }
}

impl AdminBootstrapConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let (Some(email), Some(password)) =
            (get_optional_env("ADMIN_EMAIL"), get_optional_env("ADMIN_PASSWORD"))
        else {
            return Ok(None);
        };

        let email = Email::parse(&email)
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_EMAIL".to_string(), e.to_string()))?;
        if password.len() < MIN_ADMIN_PASSWORD_LENGTH {
            return Err(ConfigError::InsecureSecret(
                "ADMIN_PASSWORD".to_string(),
                format!("must be at least {MIN_ADMIN_PASSWORD_LENGTH} characters"),
            ));
        }

        let phone = Phone::parse(&get_env_or_default("ADMIN_PHONE", "0000000000"))
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_PHONE".to_string(), e.to_string()))?;

        Ok(Some(Self {
            email,
            password: SecretString::from(password),
            phone,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Validate that a signing secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    /// Configuration suitable for router tests. Never connects anywhere.
    pub(crate) fn test_config() -> ApiConfig {
        ApiConfig {
            database: DatabaseConfig {
                target: DatabaseTarget::Url(SecretString::from(
                    "postgres://fk:fk@127.0.0.1:1/fk_test",
                )),
                max_connections: 2,
                min_connections: 0,
                acquire_timeout: Duration::from_millis(200),
                idle_timeout: Duration::from_secs(60),
                query_timeout: Duration::from_secs(1),
            },
            host: "127.0.0.1".parse().unwrap(),
            port: 10000,
            environment: Environment::Development,
            frontend_url: "https://fkdesigner.in".to_string(),
            jwt_secret: SecretString::from("k9$Lm2#Qx7!vB4@zR8&nT1^wY6*pD3%h"),
            jwt_ttl: Duration::from_secs(24 * 60 * 60),
            admin_bootstrap: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-jwt-secret-goes-here", "JWT_SECRET");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("abababababababababababababababab", "JWT_SECRET");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength("k9$Lm2#Qx7!vB4@zR8&nT1^wY6*pD3%h", "JWT_SECRET").is_ok());
    }

    #[test]
    fn test_validate_secret_length() {
        assert!(validate_secret_length(&SecretString::from("short"), "JWT_SECRET").is_err());
        assert!(validate_secret_length(&SecretString::from("x".repeat(32)), "JWT_SECRET").is_ok());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = test_config();
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("k9$Lm2#Qx7"));
        assert!(!debug_output.contains("fk:fk@"));
    }

    #[test]
    fn test_allowed_origins_include_frontend_and_local_dev() {
        let mut config = test_config();
        config.frontend_url = "https://preview.fkdesigner.in".to_string();
        let origins = config.allowed_origins();
        assert!(origins.contains(&"https://preview.fkdesigner.in".to_string()));
        assert!(origins.contains(&"https://www.fkdesigner.in".to_string()));
        assert!(origins.contains(&"http://localhost:5173".to_string()));
    }

    #[test]
    fn test_connect_options_from_parts() {
        let config = DatabaseConfig {
            target: DatabaseTarget::Parts {
                host: "db.internal".to_string(),
                port: 6543,
                user: "fk".to_string(),
                password: SecretString::from("pw"),
                database: "fk_designers".to_string(),
                ssl_mode: PgSslMode::Prefer,
            },
            ..test_config().database
        };
        let options = config.connect_options().unwrap();
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_database(), Some("fk_designers"));
        assert_eq!(options.get_application_name(), Some("fk-designers-api"));
    }

    #[test]
    fn test_socket_addr() {
        let addr = test_config().socket_addr();
        assert_eq!(addr.to_string(), "127.0.0.1:10000");
    }
}
