//! Core types for FK Designers.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod catalog;
pub mod email;
pub mod id;
pub mod pagination;
pub mod phone;
pub mod product_code;
pub mod role;

pub use catalog::{Category, CategoryError, PriceRange, ServiceType, ServiceTypeError};
pub use email::{Email, EmailError};
pub use id::*;
pub use pagination::{PageRequest, Pagination};
pub use phone::{Phone, PhoneError};
pub use product_code::ProductCode;
pub use role::Role;
