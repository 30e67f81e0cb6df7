//! Access tokens: HS256 JWTs carrying the user's id, email and role.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use fk_designers_core::{Role, UserId};

use super::AuthError;
use crate::models::UserRecord;

/// Token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Signing and verification keys derived from the configured secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl JwtKeys {
    #[must_use]
    pub fn new(secret: &SecretString, ttl: Duration) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            ttl,
        }
    }

    /// Sign a token for `user`, valid for the configured lifetime.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenEncoding` if signing fails.
    pub fn issue(&self, user: &UserRecord) -> Result<String, AuthError> {
        let iat = Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            user_id: user.user_id,
            email: user.email.to_string(),
            role: user.role,
            iat,
            exp: iat.saturating_add(ttl),
        };
        self.encode(&claims)
    }

    fn encode(&self, claims: &Claims) -> Result<String, AuthError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(AuthError::TokenEncoding)
    }

    /// Check signature and expiry.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for any malformed, tampered or
    /// expired token.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|err| {
                tracing::debug!(error = %err, "Rejected access token");
                AuthError::InvalidToken
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use fk_designers_core::Email;

    use super::*;

    fn keys() -> JwtKeys {
        JwtKeys::new(
            &SecretString::from("k9$Lm2#Qx7!vB4@zR8&nT1^wY6*pD3%h"),
            Duration::from_secs(24 * 60 * 60),
        )
    }

    fn user() -> UserRecord {
        UserRecord {
            user_id: UserId::new(42),
            first_name: "Farah".to_string(),
            last_name: "Khan".to_string(),
            email: Email::parse("farah@fkdesigner.in").unwrap(),
            phone: "+91 98765 43210".to_string(),
            password_hash: String::new(),
            role: Role::Staff,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_issue_then_verify() {
        let keys = keys();
        let token = keys.issue(&user()).unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.user_id, UserId::new(42));
        assert_eq!(claims.email, "farah@fkdesigner.in");
        assert_eq!(claims.role, Role::Staff);
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn test_claims_use_camel_case() {
        let claims = Claims {
            user_id: UserId::new(1),
            email: "a@b.co".to_string(),
            role: Role::Admin,
            iat: 0,
            exp: 1,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["userId"], 1);
        assert_eq!(json["role"], "admin");
    }

    #[test]
    fn test_expired_token_rejected() {
        let keys = keys();
        let now = Utc::now().timestamp();
        let token = keys
            .encode(&Claims {
                user_id: UserId::new(1),
                email: "a@b.co".to_string(),
                role: Role::Customer,
                iat: now - 7200,
                exp: now - 3600,
            })
            .unwrap();
        assert!(matches!(keys.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let keys = keys();
        let token = keys.issue(&user()).unwrap();
        let other = JwtKeys::new(
            &SecretString::from("Zq8!rT4#mW2$kL9^pX6&vB3*nH7@dF5%"),
            Duration::from_secs(60),
        );
        assert!(matches!(other.verify(&token), Err(AuthError::InvalidToken)));

        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = "eyJ1c2VySWQiOjF9";
        assert!(matches!(
            keys.verify(&parts.join(".")),
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(keys.verify("not-a-jwt"), Err(AuthError::InvalidToken)));
    }
}
