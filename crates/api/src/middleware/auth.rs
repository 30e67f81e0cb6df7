//! Bearer-token extractors.
//!
//! Every extractor verifies the JWT, then reloads the account so that a
//! deactivated user is locked out immediately rather than when the token
//! expires.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use fk_designers_core::{Role, UserId};

use crate::db::UserRepository;
use crate::error::{AppError, set_sentry_user};
use crate::models::CurrentUser;
use crate::services::auth::AuthError;
use crate::state::AppState;

const INSUFFICIENT_PERMISSIONS: &str = "Insufficient permissions";

/// Extractor that requires a valid access token.
///
/// # Example
///
/// ```rust,ignore
/// async fn profile(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.first_name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Extractor that requires a staff or admin account.
pub struct RequireStaff(pub CurrentUser);

/// Extractor that requires an admin account.
pub struct RequireAdmin(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state, |_| true).await.map(Self)
    }
}

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state, Role::is_staff_or_admin)
            .await
            .map(Self)
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state, Role::is_admin).await.map(Self)
    }
}

/// Verify the token and reload its account.
///
/// The role is checked twice: first against the signed claims, so a token
/// that could never pass is refused without a database round trip, then
/// against the reloaded account.
async fn authenticate(
    parts: &Parts,
    state: &AppState,
    allowed: fn(Role) -> bool,
) -> Result<CurrentUser, AppError> {
    let token = bearer_token(parts).ok_or(AuthError::MissingToken)?;
    let claims = state.jwt().verify(token)?;
    require_role(claims.user_id, claims.role, allowed)?;

    let user = UserRepository::new(state.db())
        .find_by_id(claims.user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or(AuthError::UnknownUser)?;

    set_sentry_user(&user.user_id, Some(user.email.as_str()));
    let user = CurrentUser::from(user);
    require_role(user.user_id, user.role, allowed)?;
    Ok(user)
}

fn require_role(user_id: UserId, role: Role, allowed: fn(Role) -> bool) -> Result<(), AppError> {
    if allowed(role) {
        Ok(())
    } else {
        tracing::warn!(
            user_id = %user_id,
            role = %role,
            "Rejected request for insufficient role"
        );
        Err(AppError::Forbidden(INSUFFICIENT_PERMISSIONS.to_string()))
    }
}

/// Token from `Authorization: Bearer <token>`.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(authorization: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/auth/profile");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&parts(Some("Bearer abc.def.ghi"))), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&parts(Some("bearer abc"))), Some("abc"));
        assert_eq!(bearer_token(&parts(Some("Basic dXNlcjpwYXNz"))), None);
        assert_eq!(bearer_token(&parts(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts(None)), None);
    }
}
