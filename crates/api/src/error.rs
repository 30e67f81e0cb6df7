//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Errors render as the JSON
//! envelope `{ "success": false, "message": ..., "errors"?: [...] }`;
//! server-side failures are captured to Sentry and their details are kept
//! out of the response.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::validation::FieldError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(AuthError),

    /// One or more request fields failed validation.
    #[error("Validation failed ({} fields)", .0.len())]
    Validation(Vec<FieldError>),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is authenticated but lacks the role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Resource already exists.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// An upstream query ran past its deadline.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Request body could not be read.
    #[error("Rejected body ({0}): {1}")]
    Rejection(StatusCode, String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            errors: None,
        }
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => match err {
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                RepositoryError::ForeignKey(_) => StatusCode::BAD_REQUEST,
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                RepositoryError::MissingTable(_)
                | RepositoryError::Database(_)
                | RepositoryError::DataCorruption(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials
                | AuthError::AccountInactive
                | AuthError::MissingToken
                | AuthError::InvalidToken
                | AuthError::UnknownUser => StatusCode::UNAUTHORIZED,
                AuthError::EmailTaken => StatusCode::CONFLICT,
                AuthError::Repository(_)
                | AuthError::PasswordHash(_)
                | AuthError::TokenEncoding(_)
                | AuthError::Blocking(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Rejection(status, _) => *status,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Internal details never leave the server.
    fn public_message(&self) -> String {
        match self {
            Self::Database(err) => match err {
                RepositoryError::Conflict(msg) => msg.clone(),
                RepositoryError::ForeignKey(_) => "Referenced record does not exist.".to_string(),
                RepositoryError::NotFound => "Resource not found".to_string(),
                RepositoryError::Timeout(_) => "Request timeout. Please try again.".to_string(),
                RepositoryError::MissingTable(_) => {
                    "Database table not found. Please run migrations.".to_string()
                }
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    "Internal server error".to_string()
                }
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => {
                    "Invalid email or password. Please check your credentials and try again."
                        .to_string()
                }
                AuthError::AccountInactive => {
                    "Account is inactive. Please contact support.".to_string()
                }
                AuthError::EmailTaken => "This email is already registered. Please use a different email address or try logging in.".to_string(),
                AuthError::MissingToken => "Access token required".to_string(),
                AuthError::InvalidToken => "Invalid or expired token".to_string(),
                AuthError::UnknownUser => "User not found or inactive".to_string(),
                AuthError::Repository(_)
                | AuthError::PasswordHash(_)
                | AuthError::TokenEncoding(_)
                | AuthError::Blocking(_) => "Internal server error".to_string(),
            },
            Self::Validation(_) => "Validation failed".to_string(),
            Self::BadRequest(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::NotFound(msg)
            | Self::Conflict(msg)
            | Self::Timeout(msg)
            | Self::Rejection(_, msg) => msg.clone(),
            Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() && status != StatusCode::GATEWAY_TIMEOUT {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else if status == StatusCode::GATEWAY_TIMEOUT {
            tracing::warn!(error = %self, "Request timed out");
        }

        let message = self.public_message();
        let errors = match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        };

        (
            status,
            Json(ErrorBody {
                success: false,
                message,
                errors,
            }),
        )
            .into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Repository(inner) => Self::Database(inner),
            other => Self::Auth(other),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonSyntaxError(_) => {
                Self::BadRequest("Invalid JSON format in request body".to_string())
            }
            JsonRejection::JsonDataError(err) => {
                Self::Validation(vec![FieldError::new("body", err.body_text())])
            }
            JsonRejection::MissingJsonContentType(_) => {
                Self::BadRequest("Content-Type must be application/json".to_string())
            }
            other if other.status() == StatusCode::PAYLOAD_TOO_LARGE => Self::Rejection(
                StatusCode::PAYLOAD_TOO_LARGE,
                "Request entity too large".to_string(),
            ),
            other => Self::Rejection(other.status(), other.body_text()),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context after a token has been verified.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Product not found".to_string());
        assert_eq!(err.to_string(), "Not found: Product not found");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::Forbidden("x".to_string()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Database(RepositoryError::Conflict("dup".to_string())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Database(RepositoryError::ForeignKey("fk".to_string())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Database(RepositoryError::MissingTable("products".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Database(RepositoryError::Timeout("list products")).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            AppError::Auth(AuthError::EmailTaken).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Auth(AuthError::AccountInactive).status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_validation_error_body() {
        let (status, body) = body_json(AppError::Validation(vec![FieldError::new(
            "email",
            "Please provide a valid email address",
        )]))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Validation failed");
        assert_eq!(body["errors"][0]["field"], "email");
    }

    #[tokio::test]
    async fn test_missing_table_hints_at_migrations() {
        let (status, body) =
            body_json(AppError::Database(RepositoryError::MissingTable("users".to_string()))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body["message"],
            "Database table not found. Please run migrations."
        );
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let (_, body) = body_json(AppError::Internal("pool exploded at 0xdead".to_string())).await;
        assert_eq!(body["message"], "Internal server error");
        assert!(body.get("errors").is_none());
    }

    #[tokio::test]
    async fn test_repository_error_inside_auth_keeps_its_status() {
        let (status, body) = body_json(AppError::from(AuthError::Repository(
            RepositoryError::Conflict("This email is already registered.".to_string()),
        )))
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "This email is already registered.");
    }
}
