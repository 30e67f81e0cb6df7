//! Database access for the API.
//!
//! # Tables
//!
//! - `users` - Accounts for customers, staff and admins
//! - `customers` / `staff` - 1:1 profile extensions of `users`
//! - `products` - The catalogue, keyed by product code (`FK001`)
//! - `audit_logs` - Append-only record of account and catalogue actions
//! - `contact_inquiries` / `customization_requests` - Form submissions
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p fk-designers-cli -- migrate
//! ```
//!
//! # Query execution
//!
//! Repositories never touch the pool directly. They hand a closure to
//! [`Database::run`], which applies the query timeout, retries transient
//! failures with exponential backoff, records statistics and logs slow
//! queries.

pub mod audit;
pub mod contact;
pub mod health;
pub mod products;
pub mod users;

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use crate::config::DatabaseConfig;

pub use audit::AuditRepository;
pub use contact::ContactRepository;
pub use health::{DbHealth, HEALTH_CHECK_TIMEOUT, QueryStats, StatsSnapshot};
pub use products::ProductRepository;
pub use users::UserRepository;

/// SQLSTATE codes worth retrying: admin/crash shutdown, cannot connect now,
/// connection exceptions and too many connections.
const TRANSIENT_SQLSTATES: &[&str] = &[
    "57P01", "57P02", "57P03", "08000", "08003", "08006", "53300",
];

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const UNDEFINED_TABLE: &str = "42P01";

const SLOW_QUERY_WARN: Duration = Duration::from_secs(1);
const SLOW_QUERY_DEBUG: Duration = Duration::from_millis(100);

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint violation.
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Foreign key violation.
    #[error("foreign key violation: {0}")]
    ForeignKey(String),

    /// A table the query needs does not exist (migrations not run).
    #[error("missing table: {0}")]
    MissingTable(String),

    /// The operation did not finish within its deadline.
    #[error("timed out: {0}")]
    Timeout(&'static str),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        let code = match &err {
            sqlx::Error::Database(db_err) => db_err.code().map(|c| c.into_owned()),
            _ => None,
        };
        match code.as_deref() {
            Some(UNIQUE_VIOLATION) => {
                Self::Conflict("Duplicate entry. This record already exists.".to_string())
            }
            Some(FOREIGN_KEY_VIOLATION) => Self::ForeignKey(err.to_string()),
            Some(UNDEFINED_TABLE) => Self::MissingTable(err.to_string()),
            _ => Self::Database(err),
        }
    }
}

impl RepositoryError {
    /// Whether retrying the same operation may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Database(err) => is_transient_sqlx(err),
            _ => false,
        }
    }
}

fn is_transient_sqlx(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db_err) => db_err
            .code()
            .is_some_and(|code| TRANSIENT_SQLSTATES.contains(&code.as_ref())),
        _ => false,
    }
}

/// Retry schedule for transient failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based): doubles each time,
    /// capped at `max_backoff`.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = 2_u32.saturating_pow(attempt.saturating_sub(1));
        let base_ms = u64::try_from(self.initial_backoff.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.max_backoff.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(base_ms.saturating_mul(u64::from(exponent)).min(max_ms))
    }
}

/// Connection pool plus execution policy. Cheap to clone.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
    stats: Arc<QueryStats>,
    query_timeout: Duration,
    min_connections: u32,
    retry: RetryPolicy,
}

impl Database {
    /// Create the pool without connecting.
    ///
    /// Connections are opened on first use (and kept at `min_connections`
    /// afterwards). Call [`Database::test_connection`] at startup to fail
    /// fast on a bad configuration.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error::Configuration` if the connection URL is invalid.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let statement_timeout_ms = config.query_timeout.as_millis().to_string();
        let options = config.connect_options()?.options([
            ("statement_timeout", statement_timeout_ms),
            ("lock_timeout", "15000".to_string()),
            ("idle_in_transaction_session_timeout", "300000".to_string()),
        ]);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .test_before_acquire(true)
            .connect_lazy_with(options);

        Ok(Self {
            pool,
            stats: Arc::new(QueryStats::default()),
            query_timeout: config.query_timeout,
            min_connections: config.min_connections,
            retry: RetryPolicy::default(),
        })
    }

    /// Get a reference to the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Query counters since startup.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Run a query closure with timeout, retry and bookkeeping.
    ///
    /// `f` is called once per attempt with a handle to the pool, so it must
    /// be able to rebuild its query (bind borrowed or cloned values).
    ///
    /// # Errors
    ///
    /// Returns the classified error of the last attempt. Non-transient
    /// errors are returned immediately.
    pub async fn run<T, F, Fut>(&self, op: &'static str, f: F) -> Result<T, RepositoryError>
    where
        F: Fn(PgPool) -> Fut,
        Fut: Future<Output = Result<T, sqlx::Error>>,
    {
        let mut attempt = 0;
        loop {
            let started = Instant::now();
            let result = match tokio::time::timeout(self.query_timeout, f(self.pool.clone())).await
            {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(err)) => Err(RepositoryError::from(err)),
                Err(_) => Err(RepositoryError::Timeout(op)),
            };
            let elapsed = started.elapsed();
            self.stats.record(result.is_ok());
            log_duration(op, elapsed);

            match result {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    let delay = self.retry.delay(attempt);
                    tracing::warn!(
                        op,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "Transient database error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    tracing::debug!(op, error = %err, "Database operation failed");
                    return Err(err);
                }
            }
        }
    }
}

/// Race `fut` against a deadline.
///
/// # Errors
///
/// Returns `RepositoryError::Timeout(op)` if the deadline passes first, or
/// the future's own error.
pub async fn with_timeout<T, Fut>(
    duration: Duration,
    op: &'static str,
    fut: Fut,
) -> Result<T, RepositoryError>
where
    Fut: Future<Output = Result<T, RepositoryError>>,
{
    tokio::time::timeout(duration, fut)
        .await
        .map_err(|_| RepositoryError::Timeout(op))?
}

fn log_duration(op: &'static str, elapsed: Duration) {
    let ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    if elapsed > SLOW_QUERY_WARN {
        tracing::warn!(op, duration_ms = ms, "Slow query");
    } else if elapsed > SLOW_QUERY_DEBUG {
        tracing::debug!(op, duration_ms = ms, "Query took longer than expected");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::config::tests::test_config;

    #[test]
    fn test_retry_delay_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(1), Duration::from_millis(500));
        assert_eq!(policy.delay(2), Duration::from_millis(1000));
        assert_eq!(policy.delay(3), Duration::from_millis(2000));
        assert_eq!(policy.delay(10), Duration::from_millis(2000));
    }

    #[test]
    fn test_transient_classification() {
        assert!(RepositoryError::Timeout("q").is_transient());
        assert!(RepositoryError::Database(sqlx::Error::PoolTimedOut).is_transient());
        assert!(RepositoryError::Database(sqlx::Error::PoolClosed).is_transient());
        assert!(
            RepositoryError::Database(sqlx::Error::Io(std::io::Error::from(
                std::io::ErrorKind::ConnectionReset
            )))
            .is_transient()
        );
        assert!(!RepositoryError::Database(sqlx::Error::RowNotFound).is_transient());
        assert!(!RepositoryError::Conflict("dup".to_string()).is_transient());
        assert!(!RepositoryError::MissingTable("users".to_string()).is_transient());
    }

    #[test]
    fn test_non_database_sqlx_errors_stay_database() {
        let err = RepositoryError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, RepositoryError::Database(sqlx::Error::RowNotFound)));
    }

    fn test_database() -> Database {
        let mut db = Database::connect_lazy(&test_config().database).unwrap();
        db.retry = RetryPolicy {
            max_retries: 2,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
        };
        db
    }

    #[tokio::test]
    async fn test_run_retries_transient_errors_then_succeeds() {
        let db = test_database();
        let calls = AtomicU32::new(0);
        let result = db
            .run("flaky", |_pool| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(sqlx::Error::PoolTimedOut)
                    } else {
                        Ok(n)
                    }
                }
            })
            .await
            .unwrap();
        assert_eq!(result, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let stats = db.stats();
        assert_eq!(stats.total_queries, 3);
        assert_eq!(stats.errors, 2);
    }

    #[tokio::test]
    async fn test_run_gives_up_after_max_retries() {
        let db = test_database();
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = db
            .run("down", |_pool| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(sqlx::Error::PoolTimedOut) }
            })
            .await;
        assert!(result.unwrap_err().is_transient());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_run_does_not_retry_permanent_errors() {
        let db = test_database();
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = db
            .run("missing", |_pool| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(sqlx::Error::RowNotFound) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_with_timeout_maps_elapsed() {
        let result: Result<(), _> = with_timeout(Duration::from_millis(5), "slow", async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(RepositoryError::Timeout("slow"))));
    }

    const INITIAL_SCHEMA: &str =
        include_str!("../../migrations/20250101000000_initial_schema.sql");

    /// Declared type of `table.column` in the initial schema.
    fn column_type(table: &str, column: &str) -> String {
        let start = INITIAL_SCHEMA
            .find(&format!("CREATE TABLE {table} ("))
            .unwrap();
        let body = &INITIAL_SCHEMA[start..];
        let body = &body[..body.find(");").unwrap()];
        body.lines()
            .map(str::trim)
            .find_map(|line| {
                let mut words = line.split_whitespace();
                (words.next() == Some(column))
                    .then(|| words.next().unwrap().trim_end_matches(',').to_string())
            })
            .unwrap()
    }

    #[test]
    fn test_escaped_columns_are_unbounded() {
        // A value at its length limit can grow up to six times when escaped.
        for (table, column) in [
            ("users", "first_name"),
            ("users", "last_name"),
            ("customers", "address_1"),
            ("customers", "address_2"),
            ("products", "name"),
            ("products", "subcategory"),
            ("products", "description"),
            ("products", "composition"),
            ("products", "fabric_pattern"),
            ("contact_inquiries", "name"),
            ("contact_inquiries", "subject"),
            ("contact_inquiries", "message"),
            ("customization_requests", "name"),
            ("customization_requests", "description"),
            ("customization_requests", "budget"),
            ("customization_requests", "timeline"),
            ("customization_requests", "measurements"),
        ] {
            assert_eq!(column_type(table, column), "TEXT", "{table}.{column}");
        }
        assert_eq!(column_type("users", "email"), "VARCHAR(254)");
    }
}
