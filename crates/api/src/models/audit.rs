//! Audit trail models.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use fk_designers_core::{AuditLogId, UserId};

/// Actions written to `audit_logs.action`.
pub mod action {
    pub const REGISTER: &str = "register";
    pub const LOGIN: &str = "login";
    pub const LOGOUT: &str = "logout";
    pub const CREATE_PRODUCT: &str = "create_product";
    pub const UPDATE_PRODUCT: &str = "update_product";
    pub const DELETE_PRODUCT: &str = "delete_product";
    pub const UPDATE_USER_STATUS: &str = "update_user_status";
}

/// A row to append to `audit_logs`.
#[derive(Debug, Clone)]
pub struct NewAuditLog {
    pub user_id: Option<UserId>,
    pub action: &'static str,
    pub ip_address: Option<String>,
    pub details: Value,
}

impl NewAuditLog {
    #[must_use]
    pub fn new(user_id: UserId, action: &'static str, ip_address: Option<String>, details: Value) -> Self {
        Self {
            user_id: Some(user_id),
            action,
            ip_address,
            details,
        }
    }
}

/// Filters for `GET /api/users/audit-logs`.
#[derive(Debug, Clone, Default)]
pub struct AuditLogFilter {
    pub user_id: Option<UserId>,
    pub action: Option<String>,
}

/// An `audit_logs` row joined with the acting user's name.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuditLogRow {
    pub log_id: AuditLogId,
    pub user_id: Option<UserId>,
    pub action: String,
    pub timestamp: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub details: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

/// An audit entry as served, with `details` decoded.
#[derive(Debug, Clone, Serialize)]
pub struct AuditLogEntry {
    pub log_id: AuditLogId,
    pub user_id: Option<UserId>,
    pub action: String,
    pub timestamp: DateTime<Utc>,
    pub ip_address: Option<String>,
    /// `null` when absent or not valid JSON.
    pub details: Option<Value>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl From<AuditLogRow> for AuditLogEntry {
    fn from(row: AuditLogRow) -> Self {
        Self {
            details: row
                .details
                .as_deref()
                .and_then(|raw| serde_json::from_str(raw).ok()),
            log_id: row.log_id,
            user_id: row.user_id,
            action: row.action,
            timestamp: row.timestamp,
            ip_address: row.ip_address,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(details: Option<&str>) -> AuditLogRow {
        AuditLogRow {
            log_id: AuditLogId::new(1),
            user_id: Some(UserId::new(7)),
            action: action::LOGIN.to_string(),
            timestamp: Utc::now(),
            ip_address: Some("203.0.113.9".to_string()),
            details: details.map(String::from),
            first_name: Some("Asha".to_string()),
            last_name: Some("Rao".to_string()),
            email: Some("asha@example.com".to_string()),
        }
    }

    #[test]
    fn test_details_are_decoded() {
        let entry = AuditLogEntry::from(row(Some(r#"{"email":"asha@example.com"}"#)));
        assert_eq!(
            entry.details.and_then(|d| d.get("email").cloned()),
            Some(Value::from("asha@example.com"))
        );
    }

    #[test]
    fn test_undecodable_details_become_null() {
        assert!(AuditLogEntry::from(row(Some("not json"))).details.is_none());
        assert!(AuditLogEntry::from(row(None)).details.is_none());
    }
}
