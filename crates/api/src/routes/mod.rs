//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /                              Service banner
//! GET    /health                        Database and process health
//!
//! POST   /api/auth/register             Create a customer account
//! POST   /api/auth/login                Exchange credentials for a token
//! POST   /api/auth/logout               Audit a logout (auth)
//! GET    /api/auth/profile              Current user with customer details (auth)
//!
//! GET    /api/products                  Filtered, sorted, paginated catalog
//! GET    /api/products/{id}             Single product
//! POST   /api/products                  Create (staff)
//! PUT    /api/products/{id}             Update (staff)
//! DELETE /api/products/{id}             Delete (admin)
//!
//! GET    /api/users/customers           Customer listing (staff)
//! GET    /api/users/staff               Staff listing (admin)
//! PATCH  /api/users/{userId}/status     Activate or deactivate (admin)
//! GET    /api/users/audit-logs          Audit trail (admin)
//!
//! POST   /api/contact/contact           Contact form
//! POST   /api/contact/customization     Customization request form
//! ```

pub mod auth;
pub mod contact;
pub mod health;
pub mod products;
pub mod users;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::middleware::{auth_rate_limiter, products_rate_limiter};
use crate::state::AppState;

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/profile", get(auth::profile))
        .layer(auth_rate_limiter())
}

fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::destroy),
        )
        .layer(products_rate_limiter())
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/customers", get(users::customers))
        .route("/staff", get(users::staff))
        .route("/{userId}/status", patch(users::update_status))
        .route("/audit-logs", get(users::audit_logs))
}

fn contact_routes() -> Router<AppState> {
    Router::new()
        .route("/contact", post(contact::contact))
        .route("/customization", post(contact::customization))
}

/// All routes, without the middleware stack (see [`crate::app`]).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::banner))
        .route("/health", get(health::health))
        .nest("/api/auth", auth_routes())
        .nest("/api/products", product_routes())
        .nest("/api/users", user_routes())
        .nest("/api/contact", contact_routes())
        .fallback(health::not_found)
}
