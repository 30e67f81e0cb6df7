//! User roles.

use serde::{Deserialize, Serialize};

/// Role of an account.
///
/// Maps to the `user_role` enum in `PostgreSQL`. Staff and admins share the
/// catalogue and customer screens; only admins manage accounts, staff and
/// the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Registered shopper.
    #[default]
    Customer,
    /// Shop employee.
    Staff,
    /// Full access.
    Admin,
}

impl Role {
    /// Whether this role may manage the product catalogue and view customers.
    #[must_use]
    pub const fn is_staff_or_admin(self) -> bool {
        matches!(self, Self::Staff | Self::Admin)
    }

    /// Whether this role has full access.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// The lowercase name used in the database and in tokens.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Staff => "staff",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "staff" => Ok(Self::Staff),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}
