//! CORS policy for the storefront and local development.

use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::ApiConfig;

/// CORS layer allowing the configured origins, with credentials.
///
/// Origins that fail to parse as header values are skipped with a warning.
#[must_use]
pub fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins()
        .into_iter()
        .filter_map(|origin| match HeaderValue::from_str(&origin) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(origin = %origin, error = %err, "Skipping invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
        ])
        .max_age(Duration::from_secs(24 * 60 * 60))
}
