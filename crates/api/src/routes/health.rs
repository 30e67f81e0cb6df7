//! Service health, banner and the JSON 404 fallback.

use axum::{
    Json,
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use crate::db::DbHealth;
use crate::state::AppState;

/// Endpoints advertised by the banner and the 404 fallback.
pub const AVAILABLE_ENDPOINTS: [&str; 6] = [
    "/health",
    "/api/auth",
    "/api/products",
    "/api/users",
    "/api/contact",
    "/",
];

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub timestamp: chrono::DateTime<Utc>,
    pub uptime_seconds: u64,
    pub environment: &'static str,
    pub database: DbHealth,
    pub version: &'static str,
}

/// `GET /health`
///
/// 200 while the database answers, 503 otherwise.
pub async fn health(State(state): State<AppState>) -> Response {
    let database = state.db().health_check().await;
    let healthy = database.is_healthy();
    let report = HealthReport {
        status: if healthy { "OK" } else { "ERROR" },
        timestamp: Utc::now(),
        uptime_seconds: state.uptime().as_secs(),
        environment: state.config().environment.as_str(),
        database,
        version: env!("CARGO_PKG_VERSION"),
    };
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report)).into_response()
}

/// `GET /`
pub async fn banner() -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "message": "FK Designers API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/health",
            "auth": "/api/auth",
            "products": "/api/products",
            "users": "/api/users",
            "contact": "/api/contact",
        },
    }))
}

/// Router fallback.
pub async fn not_found(method: Method, uri: Uri) -> Response {
    tracing::debug!(%method, %uri, "Unknown endpoint");
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "message": "API endpoint not found",
            "path": uri.path(),
            "method": method.as_str(),
            "availableEndpoints": AVAILABLE_ENDPOINTS,
        })),
    )
        .into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_not_found_lists_endpoints() {
        let response = not_found(Method::DELETE, Uri::from_static("/api/nope?x=1")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["path"], "/api/nope");
        assert_eq!(body["method"], "DELETE");
        assert_eq!(body["availableEndpoints"][1], "/api/auth");
    }
}
