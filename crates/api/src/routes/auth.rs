//! `/api/auth`: registration, login, logout and profile.

use axum::extract::State;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::db::{AuditRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::extract::Json;
use crate::middleware::{ClientIp, RequireAuth};
use crate::models::audit::action;
use crate::models::{CustomerProfile, NewAuditLog, Profile, PublicUser};
use crate::response::ApiResponse;
use crate::services::auth::{AuthService, Registration};
use crate::state::AppState;
use crate::validation::{Validator, escape_html, missing_after_validation};

const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
    pub date_of_birth: Option<String>,
    pub address_1: Option<String>,
    pub address_2: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Account plus a fresh access token.
#[derive(Debug, Serialize)]
pub struct AuthPayload {
    pub user: PublicUser,
    pub token: String,
}

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<AppState>,
    ip: ClientIp,
    Json(body): Json<RegisterRequest>,
) -> Result<ApiResponse<AuthPayload>> {
    let mut v = Validator::new();
    let first_name = v.text("first_name", body.first_name.as_deref(), 2, 50);
    let last_name = v.text("last_name", body.last_name.as_deref(), 2, 50);
    let email = v.email("email", body.email.as_deref());
    let phone = v.phone("phone", body.phone.as_deref());
    let password = v.password("password", body.password.as_deref(), MIN_PASSWORD_LENGTH);
    let date_of_birth = v.optional_date("date_of_birth", body.date_of_birth.as_deref());
    let address_1 = v.optional_text("address_1", body.address_1.as_deref(), 255);
    let address_2 = v.optional_text("address_2", body.address_2.as_deref(), 255);
    v.finish()?;

    let (Some(first_name), Some(last_name), Some(email), Some(phone), Some(password)) =
        (first_name, last_name, email, phone, password)
    else {
        return Err(missing_after_validation());
    };

    tracing::info!(email = %email, "Registration attempt");

    let user = AuthService::new(state.db())
        .register(Registration {
            first_name: escape_html(&first_name),
            last_name: escape_html(&last_name),
            email,
            phone,
            password,
            profile: CustomerProfile {
                date_of_birth,
                address_1: address_1.as_deref().map(escape_html),
                address_2: address_2.as_deref().map(escape_html),
            },
        })
        .await?;

    AuditRepository::new(state.db())
        .record(NewAuditLog::new(
            user.user_id,
            action::REGISTER,
            ip.to_db(),
            json!({ "email": user.email, "role": user.role }),
        ))
        .await;

    let token = state.jwt().issue(&user)?;
    tracing::info!(user_id = %user.user_id, "Registration successful");

    Ok(ApiResponse::created(
        "User registered successfully",
        AuthPayload {
            user: PublicUser::from(user),
            token,
        },
    ))
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    ip: ClientIp,
    Json(body): Json<LoginRequest>,
) -> Result<ApiResponse<AuthPayload>> {
    let mut v = Validator::new();
    let email = v.email("email", body.email.as_deref());
    let password = match body.password.as_deref() {
        Some(p) if !p.is_empty() => Some(p.to_string()),
        _ => {
            v.reject("password", "Password is required");
            None
        }
    };
    v.finish()?;

    let (Some(email), Some(password)) = (email, password) else {
        return Err(missing_after_validation());
    };

    let user = AuthService::new(state.db())
        .login(&email, &password)
        .await
        .inspect_err(|err| tracing::info!(email = %email, reason = %err, "Login rejected"))?;

    let token = state.jwt().issue(&user)?;

    AuditRepository::new(state.db())
        .record(NewAuditLog::new(
            user.user_id,
            action::LOGIN,
            ip.to_db(),
            json!({ "email": user.email }),
        ))
        .await;

    tracing::info!(user_id = %user.user_id, role = %user.role, "Login successful");

    Ok(ApiResponse::with_message(
        "Login successful",
        AuthPayload {
            user: PublicUser::from(user),
            token,
        },
    ))
}

/// `POST /api/auth/logout`
///
/// Tokens are stateless; this only records the event.
pub async fn logout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ip: ClientIp,
) -> ApiResponse<()> {
    AuditRepository::new(state.db())
        .record(NewAuditLog::new(
            user.user_id,
            action::LOGOUT,
            ip.to_db(),
            json!({ "email": user.email }),
        ))
        .await;

    ApiResponse::message("Logout successful")
}

/// `GET /api/auth/profile`
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<ApiResponse<Profile>> {
    let profile = UserRepository::new(state.db())
        .profile(user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(ApiResponse::ok(profile))
}
