//! FK Designers API library.
//!
//! The binary in `main.rs` only loads configuration, initialises telemetry
//! and serves [`app`]; everything else lives here so it can be exercised
//! from tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
pub mod validation;

use std::any::Any;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tower_http::{catch_panic::CatchPanicLayer, compression::CompressionLayer, trace::TraceLayer};
use tracing::Span;

use crate::error::ErrorBody;
use crate::state::AppState;

/// Largest accepted request body.
pub const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// The complete application: routes plus the middleware stack described in
/// [`middleware`].
pub fn app(state: AppState) -> Router {
    let cors = middleware::cors_layer(state.config());

    routes::routes()
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(axum::middleware::from_fn(
            middleware::request_timeout_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(cors)
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: std::time::Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        tracing::info!("request completed");
                    },
                ),
        )
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    tracing::error!(panic = detail, "Handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody::new("Internal server error")),
    )
        .into_response()
}
