//! Audit log repository.

use fk_designers_core::PageRequest;

use super::{Database, RepositoryError};
use crate::models::{AuditLogEntry, AuditLogFilter, AuditLogRow, NewAuditLog};

/// Repository for the append-only audit trail.
pub struct AuditRepository<'a> {
    db: &'a Database,
}

impl<'a> AuditRepository<'a> {
    /// Create a new audit repository.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Append an entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(&self, entry: &NewAuditLog) -> Result<(), RepositoryError> {
        let details = entry.details.to_string();
        self.db
            .run("insert_audit_log", |pool| {
                let details = details.as_str();
                async move {
                    sqlx::query(
                        r"
                        INSERT INTO audit_logs (user_id, action, timestamp, ip_address, details)
                        VALUES ($1, $2, NOW(), $3, $4)
                        ",
                    )
                    .bind(entry.user_id)
                    .bind(entry.action)
                    .bind(entry.ip_address.as_deref())
                    .bind(details)
                    .execute(&pool)
                    .await
                }
            })
            .await?;
        Ok(())
    }

    /// Append an entry after the primary action already succeeded.
    ///
    /// Failures are logged and swallowed.
    pub async fn record(&self, entry: NewAuditLog) {
        if let Err(err) = self.insert(&entry).await {
            tracing::warn!(
                action = entry.action,
                user_id = ?entry.user_id,
                error = %err,
                "Failed to write audit log"
            );
        }
    }

    /// One page of entries, newest first, plus the total count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either query fails.
    pub async fn list(
        &self,
        filter: &AuditLogFilter,
        page: PageRequest,
    ) -> Result<(Vec<AuditLogEntry>, i64), RepositoryError> {
        let mut conditions = Vec::new();
        if filter.user_id.is_some() {
            conditions.push(format!("al.user_id = ${}", conditions.len() + 1));
        }
        if filter.action.is_some() {
            conditions.push(format!("al.action = ${}", conditions.len() + 1));
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let n = conditions.len() + 1;

        let count_sql = format!(
            "SELECT COUNT(*) FROM audit_logs al LEFT JOIN users u ON al.user_id = u.user_id {where_clause}"
        );
        let list_sql = format!(
            r"
            SELECT al.log_id, al.user_id, al.action, al.timestamp, al.ip_address, al.details,
                   u.first_name, u.last_name, u.email
            FROM audit_logs al
            LEFT JOIN users u ON al.user_id = u.user_id
            {where_clause}
            ORDER BY al.timestamp DESC
            LIMIT ${n} OFFSET ${}
            ",
            n + 1
        );
        let limit = i64::from(page.limit());
        let offset = page.offset();

        let total = self.db.run("count_audit_logs", |pool| {
            let sql = count_sql.as_str();
            async move {
                let mut q = sqlx::query_scalar::<_, i64>(sql);
                if let Some(user_id) = filter.user_id {
                    q = q.bind(user_id);
                }
                if let Some(action) = filter.action.as_deref() {
                    q = q.bind(action);
                }
                q.fetch_one(&pool).await
            }
        });
        let rows = self.db.run("list_audit_logs", |pool| {
            let sql = list_sql.as_str();
            async move {
                let mut q = sqlx::query_as::<_, AuditLogRow>(sql);
                if let Some(user_id) = filter.user_id {
                    q = q.bind(user_id);
                }
                if let Some(action) = filter.action.as_deref() {
                    q = q.bind(action);
                }
                q.bind(limit).bind(offset).fetch_all(&pool).await
            }
        });

        let (rows, total) = tokio::try_join!(rows, total)?;
        Ok((rows.into_iter().map(AuditLogEntry::from).collect(), total))
    }
}
