//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transactions)
//! 2. `CatchPanicLayer` (panics become a 500 envelope)
//! 3. `TraceLayer` (request span with method, uri, status, latency)
//! 4. Request ID
//! 5. CORS
//! 6. Security headers
//! 7. Compression, body limit, request timeout
//! 8. Rate limiting (per nested router)

pub mod auth;
pub mod client_ip;
pub mod cors;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod timeout;

pub use auth::{RequireAdmin, RequireAuth, RequireStaff};
pub use client_ip::ClientIp;
pub use cors::cors_layer;
pub use rate_limit::{auth_rate_limiter, products_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use timeout::request_timeout_middleware;
