//! Row and response types.
//!
//! `*Row`/`*Record` types mirror table rows (`sqlx::FromRow`); the
//! serializable types beside them are what handlers put in the envelope.

pub mod audit;
pub mod contact;
pub mod product;
pub mod user;

pub use audit::{AuditLogEntry, AuditLogFilter, AuditLogRow, NewAuditLog};
pub use contact::{NewContactInquiry, NewCustomizationRequest};
pub use product::{NewProduct, Product, ProductPage, ProductRow};
pub use user::{
    CurrentUser, CustomerProfile, CustomerSummary, NewUser, Profile, PublicUser, StaffProfile,
    StaffSummary, UserRecord,
};
