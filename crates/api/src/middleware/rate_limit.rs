//! Rate limiting middleware using governor and `tower_governor`.
//!
//! - `auth_rate_limiter`: ~15 requests per 10 minutes per IP
//! - `products_rate_limiter`: ~30 requests per minute per IP
//!
//! Limiters are layered on the nested routers, inside CORS, so a 429 still
//! carries the CORS headers the browser needs to read it.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::ConnectInfo,
    http::{HeaderValue, Request, Response, StatusCode, header::RETRY_AFTER},
    response::IntoResponse,
};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use serde_json::json;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

use super::client_ip::ip_from_headers;

// =============================================================================
// Client IP Key Extractor
// =============================================================================

/// Keys requests by client IP: proxy headers first, then the socket peer.
///
/// Requests with neither share one bucket rather than bypassing the limit.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        Ok(ip_from_headers(req.headers())
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED)))
    }
}

// =============================================================================
// Rate Limiter Configuration
// =============================================================================

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer = GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, Body>;

/// Rate limiter for `/api/auth`: one request every 40 seconds, burst of 15.
///
/// # Panics
///
/// This function will not panic. `per_second(40)` and `burst_size(15)` are
/// valid positive values, which `GovernorConfigBuilder` always accepts.
#[must_use]
pub fn auth_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(40)
        .burst_size(15)
        .finish()
        .expect("rate limiter config with per_second(40) and burst_size(15) is valid");
    GovernorLayer::new(Arc::new(config)).error_handler(|err| {
        rate_limited(err, "Too many authentication attempts. Please try again later.")
    })
}

/// Rate limiter for `/api/products`: one request every 2 seconds, burst of 30.
///
/// # Panics
///
/// This function will not panic. `per_second(2)` and `burst_size(30)` are
/// valid positive values, which `GovernorConfigBuilder` always accepts.
#[must_use]
pub fn products_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(2)
        .burst_size(30)
        .finish()
        .expect("rate limiter config with per_second(2) and burst_size(30) is valid");
    GovernorLayer::new(Arc::new(config))
        .error_handler(|err| rate_limited(err, "Too many product requests. Please slow down."))
}

/// JSON body for a rejected request.
fn rate_limited(err: GovernorError, message: &'static str) -> Response<Body> {
    match err {
        GovernorError::TooManyRequests { wait_time, .. } => {
            tracing::warn!(retry_after_secs = wait_time, "Rate limit exceeded");
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({
                    "success": false,
                    "message": message,
                    "retryAfter": wait_time,
                })),
            )
                .into_response();
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(wait_time));
            response
        }
        other => {
            tracing::error!(error = %other, "Rate limiter failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "message": "Internal server error" })),
            )
                .into_response()
        }
    }
}
