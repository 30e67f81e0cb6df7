//! FK Designers Core - Shared domain types.
//!
//! This crate provides the types used across all FK Designers components:
//! - `api` - The REST API server
//! - `cli` - Command-line tools for migrations and user management
//! - `integration-tests` - HTTP tests against a running server
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP. Database encoding is available behind the
//! `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, phone numbers, roles, product codes,
//!   categories and pagination

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
