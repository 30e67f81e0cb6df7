//! Correlation IDs.
//!
//! Uses the `x-request-id` set by an upstream proxy, or generates a UUID v4.
//! The ID is recorded on the `http_request` span, tagged on the Sentry
//! scope, stored as a [`RequestId`] extension for inner layers and echoed in
//! the response headers.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream ID accepted before a fresh one is generated.
const MAX_UPSTREAM_LEN: usize = 128;

/// The ID assigned to the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

fn upstream_id(request: &Request) -> Option<String> {
    request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.len() <= MAX_UPSTREAM_LEN)
        .map(String::from)
}

pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = upstream_id(&request).unwrap_or_else(|| Uuid::new_v4().to_string());

    Span::current().record("request_id", request_id.as_str());
    sentry::configure_scope(|scope| scope.set_tag("request_id", &request_id));
    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;

    use super::*;

    fn request(id: Option<&str>) -> Request {
        let mut builder = Request::builder().uri("/health");
        if let Some(id) = id {
            builder = builder.header(REQUEST_ID_HEADER, id);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_upstream_id_is_kept() {
        assert_eq!(upstream_id(&request(Some(" cf-123 "))).as_deref(), Some("cf-123"));
    }

    #[test]
    fn test_unusable_upstream_ids_are_ignored() {
        assert!(upstream_id(&request(None)).is_none());
        assert!(upstream_id(&request(Some("   "))).is_none());
        let long = "x".repeat(MAX_UPSTREAM_LEN + 1);
        assert!(upstream_id(&request(Some(&long))).is_none());
    }
}
