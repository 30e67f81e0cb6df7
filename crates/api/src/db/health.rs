//! Pool health, query statistics, background maintenance and shutdown drain.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::Row;
use tokio::task::JoinHandle;

use super::{Database, RepositoryError, with_timeout};

/// Deadline for the health probe. Not retried.
pub const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Counters updated by every [`Database::run`] attempt.
#[derive(Debug, Default)]
pub struct QueryStats {
    total: AtomicU64,
    errors: AtomicU64,
    /// Unix millis of the last attempt, 0 if none.
    last_activity_ms: AtomicI64,
}

impl QueryStats {
    pub(crate) fn record(&self, ok: bool) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
        self.last_activity_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        let total_queries = self.total.load(Ordering::Relaxed);
        let errors = self.errors.load(Ordering::Relaxed);
        let last = self.last_activity_ms.load(Ordering::Relaxed);
        StatsSnapshot {
            total_queries,
            errors,
            error_rate: error_rate(total_queries, errors),
            last_activity: (last > 0)
                .then(|| DateTime::<Utc>::from_timestamp_millis(last))
                .flatten(),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn error_rate(total: u64, errors: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        errors as f64 / total as f64
    }
}

/// Point-in-time copy of [`QueryStats`].
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub total_queries: u64,
    pub errors: u64,
    pub error_rate: f64,
    pub last_activity: Option<DateTime<Utc>>,
}

/// Pool occupancy.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PoolStats {
    pub total: u32,
    pub idle: u32,
    pub active: u32,
}

/// Result of [`Database::health_check`].
#[derive(Debug, Clone, Serialize)]
pub struct DbHealth {
    /// `healthy` or `unhealthy`.
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub response_time_ms: u64,
    pub pool: PoolStats,
    pub stats: StatsSnapshot,
}

impl DbHealth {
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

impl Database {
    /// Current pool occupancy.
    #[must_use]
    pub fn pool_stats(&self) -> PoolStats {
        let total = self.pool.size();
        let idle = u32::try_from(self.pool.num_idle()).unwrap_or(total);
        PoolStats {
            total,
            idle,
            active: total.saturating_sub(idle),
        }
    }

    /// Probe the server and report pool and query statistics.
    ///
    /// A single attempt bounded by [`HEALTH_CHECK_TIMEOUT`], so the report
    /// always arrives well inside the request deadline. Never fails; an
    /// unreachable database yields `status: "unhealthy"`.
    pub async fn health_check(&self) -> DbHealth {
        let started = Instant::now();
        let probe = with_timeout(HEALTH_CHECK_TIMEOUT, "health_check", async {
            sqlx::query(
                r"SELECT NOW() AS server_time, current_database()::text AS database, version() AS version",
            )
            .fetch_one(&self.pool)
            .await
            .map_err(RepositoryError::from)
        })
        .await;
        self.stats.record(probe.is_ok());
        let response_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let base = DbHealth {
            status: "healthy",
            database: None,
            server_time: None,
            version: None,
            error: None,
            response_time_ms,
            pool: self.pool_stats(),
            stats: self.stats(),
        };

        match probe {
            Ok(row) => DbHealth {
                database: row.try_get("database").ok(),
                server_time: row.try_get("server_time").ok(),
                version: row
                    .try_get::<String, _>("version")
                    .ok()
                    .map(|v| v.split_whitespace().take(2).collect::<Vec<_>>().join(" ")),
                ..base
            },
            Err(err) => {
                tracing::error!(error = %err, "Database health check failed");
                DbHealth {
                    status: "unhealthy",
                    error: Some(err.to_string()),
                    ..base
                }
            }
        }
    }

    /// Startup probe: retry until the database answers, then log what it
    /// contains.
    ///
    /// Attempt `n` waits `min(3s * n, 15s)` before the next try.
    ///
    /// # Errors
    ///
    /// Returns the last error once `attempts` probes have failed.
    pub async fn test_connection(&self, attempts: u32) -> Result<(), RepositoryError> {
        let mut attempt = 1;
        loop {
            match self.probe_contents().await {
                Ok(()) => return Ok(()),
                Err(err) if attempt < attempts => {
                    let delay = Duration::from_secs(u64::from(3 * attempt).min(15));
                    tracing::warn!(
                        attempt,
                        attempts,
                        retry_in_secs = delay.as_secs(),
                        error = %err,
                        "Database not reachable yet"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn probe_contents(&self) -> Result<(), RepositoryError> {
        let version: String = self
            .run("startup_version", |pool| async move {
                sqlx::query_scalar("SELECT version()").fetch_one(&pool).await
            })
            .await?;
        tracing::info!(version = %version, "Connected to PostgreSQL");

        let has_users: bool = self
            .run("startup_tables", |pool| async move {
                sqlx::query_scalar("SELECT to_regclass('public.users') IS NOT NULL")
                    .fetch_one(&pool)
                    .await
            })
            .await?;
        if !has_users {
            tracing::warn!("Table 'users' not found. Run migrations: fkd-cli migrate");
            return Ok(());
        }

        let (users, admins): (i64, i64) = self
            .run("startup_counts", |pool| async move {
                sqlx::query_as(
                    r"SELECT COUNT(*), COUNT(*) FILTER (WHERE role = 'admin') FROM users",
                )
                .fetch_one(&pool)
                .await
            })
            .await?;
        tracing::info!(users, admins, "Database contents checked");
        if admins == 0 {
            tracing::warn!("No admin account exists yet");
        }
        Ok(())
    }

    /// Log health every `interval` and top the pool back up to its minimum.
    ///
    /// The task runs until aborted.
    #[must_use]
    pub fn spawn_maintenance(&self, interval: Duration) -> JoinHandle<()> {
        let db = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                db.maintain().await;
            }
        })
    }

    async fn maintain(&self) {
        let health = self.health_check().await;
        tracing::info!(
            status = health.status,
            response_time_ms = health.response_time_ms,
            pool_total = health.pool.total,
            pool_idle = health.pool.idle,
            pool_active = health.pool.active,
            total_queries = health.stats.total_queries,
            errors = health.stats.errors,
            "Database maintenance"
        );
        if health.stats.error_rate > 0.1 && health.stats.total_queries >= 100 {
            tracing::warn!(
                error_rate = health.stats.error_rate,
                "High database error rate"
            );
        }

        if health.is_healthy() && health.pool.total < self.min_connections {
            let missing = self.min_connections - health.pool.total;
            let mut warmed = Vec::new();
            for _ in 0..missing {
                match self.pool.acquire().await {
                    Ok(conn) => warmed.push(conn),
                    Err(err) => {
                        tracing::warn!(error = %err, "Failed to warm connection pool");
                        break;
                    }
                }
            }
            tracing::info!(warmed = warmed.len(), "Connection pool warmed");
        }
    }

    /// Wait for checked-out connections to come back, then close the pool.
    ///
    /// Polls once a second for up to `max_wait`.
    pub async fn drain(&self, max_wait: Duration) {
        let started = Instant::now();
        loop {
            let stats = self.pool_stats();
            if stats.active == 0 {
                break;
            }
            if started.elapsed() >= max_wait {
                tracing::warn!(
                    active = stats.active,
                    "Closing pool with connections still in use"
                );
                break;
            }
            tracing::info!(active = stats.active, "Waiting for database connections to finish");
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        self.pool.close().await;
        tracing::info!(stats = ?self.stats(), "Database pool closed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;

    #[test]
    fn test_stats_snapshot() {
        let stats = QueryStats::default();
        let empty = stats.snapshot();
        assert_eq!(empty.total_queries, 0);
        assert!(empty.last_activity.is_none());
        assert!(empty.error_rate.abs() < f64::EPSILON);

        stats.record(true);
        stats.record(true);
        stats.record(false);
        stats.record(true);
        let snap = stats.snapshot();
        assert_eq!(snap.total_queries, 4);
        assert_eq!(snap.errors, 1);
        assert!((snap.error_rate - 0.25).abs() < f64::EPSILON);
        assert!(snap.last_activity.is_some());
    }

    #[tokio::test]
    async fn test_health_check_gives_up_at_its_own_deadline() {
        // Production-sized acquire timeout against a port nothing listens on.
        let mut config = test_config().database;
        config.acquire_timeout = Duration::from_secs(20);
        config.query_timeout = Duration::from_secs(30);
        let db = Database::connect_lazy(&config).unwrap();

        let started = Instant::now();
        let health = db.health_check().await;
        assert!(started.elapsed() < HEALTH_CHECK_TIMEOUT + Duration::from_secs(2));
        assert!(!health.is_healthy());
        assert!(health.error.is_some());
        assert_eq!(db.stats().total_queries, 1);
        assert_eq!(db.stats().errors, 1);
    }
}
