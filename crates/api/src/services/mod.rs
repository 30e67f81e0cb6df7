//! Business logic between the HTTP handlers and the repositories.

pub mod auth;
pub mod bootstrap;
pub mod product_cache;
pub mod product_query;
