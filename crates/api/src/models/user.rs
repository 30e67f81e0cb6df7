//! Account models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use fk_designers_core::{CustomerId, Email, Phone, Role, StaffId, UserId};

/// A `users` row, including the password hash. Never serialized.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: String,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<UserRecord> for PublicUser {
    fn from(record: UserRecord) -> Self {
        Self {
            user_id: record.user_id,
            first_name: record.first_name,
            last_name: record.last_name,
            email: record.email,
            phone: record.phone,
            role: record.role,
            is_active: record.is_active,
            created_at: record.created_at,
        }
    }
}

/// The authenticated caller, resolved from a bearer token and re-checked
/// against the database on every request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: UserId,
    pub email: Email,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
}

impl From<UserRecord> for CurrentUser {
    fn from(record: UserRecord) -> Self {
        Self {
            user_id: record.user_id,
            email: record.email,
            role: record.role,
            first_name: record.first_name,
            last_name: record.last_name,
        }
    }
}

/// Values for a new `users` row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: Phone,
    pub password_hash: String,
    pub role: Role,
}

/// Values for a new `customers` row.
#[derive(Debug, Clone, Default)]
pub struct CustomerProfile {
    pub date_of_birth: Option<NaiveDate>,
    pub address_1: Option<String>,
    pub address_2: Option<String>,
}

/// Values for a new `staff` row.
#[derive(Debug, Clone)]
pub struct StaffProfile {
    pub position: String,
    pub department: String,
    pub start_date: NaiveDate,
}

/// `GET /api/auth/profile`: the account joined with its customer details.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub date_of_birth: Option<NaiveDate>,
    pub address_1: Option<String>,
    pub address_2: Option<String>,
}

/// Row of `GET /api/users/customers`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CustomerSummary {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub customer_id: CustomerId,
    pub date_of_birth: Option<NaiveDate>,
    pub address_1: Option<String>,
    pub address_2: Option<String>,
}

/// Row of `GET /api/users/staff`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StaffSummary {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub staff_id: StaffId,
    pub position: String,
    pub department: String,
    pub start_date: NaiveDate,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_public_user_never_carries_password_hash() {
        let record = UserRecord {
            user_id: UserId::new(3),
            first_name: "Meera".to_string(),
            last_name: "Iyer".to_string(),
            email: Email::parse("meera@example.com").unwrap(),
            phone: "9876543210".to_string(),
            password_hash: "$2b$12$abcdefghijklmnopqrstuv".to_string(),
            role: Role::Customer,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(PublicUser::from(record)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["user_id"], 3);
        assert_eq!(json["role"], "customer");
    }
}
