//! `/api/users`: customer and staff listings, account status, audit trail.

use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use fk_designers_core::{PageRequest, Pagination, UserId};

use crate::db::{AuditRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::extract::Json;
use crate::middleware::{ClientIp, RequireAdmin, RequireStaff};
use crate::models::audit::action;
use crate::models::{AuditLogEntry, AuditLogFilter, CustomerSummary, NewAuditLog, StaffSummary};
use crate::response::ApiResponse;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: u32 = 50;
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageQuery {
    fn request(&self) -> PageRequest {
        PageRequest::from_query(
            self.page.as_deref(),
            self.limit.as_deref(),
            DEFAULT_PAGE_SIZE,
            MAX_PAGE_SIZE,
        )
    }
}

#[derive(Debug, Serialize)]
pub struct CustomerList {
    pub customers: Vec<CustomerSummary>,
    pub pagination: Pagination,
}

/// `GET /api/users/customers`
pub async fn customers(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Query(query): Query<PageQuery>,
) -> Result<ApiResponse<CustomerList>> {
    let request = query.request();
    let (customers, total) = UserRepository::new(state.db())
        .list_customers(request)
        .await?;

    Ok(ApiResponse::ok(CustomerList {
        customers,
        pagination: Pagination::new(request, total),
    }))
}

/// `GET /api/users/staff`
pub async fn staff(
    State(state): State<AppState>,
    RequireAdmin(_user): RequireAdmin,
) -> Result<ApiResponse<Vec<StaffSummary>>> {
    let staff = UserRepository::new(state.db()).list_staff().await?;
    Ok(ApiResponse::ok(staff))
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusRequest {
    pub is_active: Option<Value>,
}

/// `PATCH /api/users/{userId}/status`
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ip: ClientIp,
    Path(user_id): Path<i32>,
    Json(body): Json<StatusRequest>,
) -> Result<ApiResponse<()>> {
    let Some(Value::Bool(is_active)) = body.is_active else {
        return Err(AppError::BadRequest(
            "is_active must be a boolean value".to_string(),
        ));
    };
    let user_id = UserId::new(user_id);

    let user = UserRepository::new(state.db())
        .set_active(user_id, is_active)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    AuditRepository::new(state.db())
        .record(NewAuditLog::new(
            admin.user_id,
            action::UPDATE_USER_STATUS,
            ip.to_db(),
            json!({
                "target_user_id": user.user_id,
                "target_email": user.email,
                "new_status": is_active,
            }),
        ))
        .await;

    tracing::info!(
        target_user_id = %user.user_id,
        is_active,
        admin_id = %admin.user_id,
        "User status changed"
    );
    let verb = if is_active { "activated" } else { "deactivated" };
    Ok(ApiResponse::message(format!("User {verb} successfully")))
}

#[derive(Debug, Default, Deserialize)]
pub struct AuditLogQuery {
    pub user_id: Option<String>,
    pub action: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuditLogList {
    pub logs: Vec<AuditLogEntry>,
    pub pagination: Pagination,
}

/// `GET /api/users/audit-logs`
pub async fn audit_logs(
    State(state): State<AppState>,
    RequireAdmin(_user): RequireAdmin,
    Query(query): Query<AuditLogQuery>,
) -> Result<ApiResponse<AuditLogList>> {
    let user_id = match query.user_id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(raw.parse::<i32>().map(UserId::new).map_err(|_| {
            AppError::BadRequest("user_id must be an integer".to_string())
        })?),
        None => None,
    };
    let filter = AuditLogFilter {
        user_id,
        action: query
            .action
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from),
    };
    let request = PageRequest::from_query(
        query.page.as_deref(),
        query.limit.as_deref(),
        DEFAULT_PAGE_SIZE,
        MAX_PAGE_SIZE,
    );

    let (logs, total) = AuditRepository::new(state.db())
        .list(&filter, request)
        .await?;

    Ok(ApiResponse::ok(AuditLogList {
        logs,
        pagination: Pagination::new(request, total),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_query_defaults_and_clamp() {
        let request = PageQuery::default().request();
        assert_eq!(request.page(), 1);
        assert_eq!(request.limit(), 50);

        let request = PageQuery {
            page: Some("3".to_string()),
            limit: Some("1000".to_string()),
        }
        .request();
        assert_eq!(request.page(), 3);
        assert_eq!(request.limit(), 100);
        assert_eq!(request.offset(), 200);
    }
}
