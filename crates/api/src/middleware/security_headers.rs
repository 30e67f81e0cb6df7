//! Security headers for a JSON API consumed cross-origin.
//!
//! No Content-Security-Policy (responses are never rendered as HTML) and
//! no `Cross-Origin-Embedder-Policy`, so the storefront can embed product
//! image URLs it receives from here.

use axum::{
    extract::Request,
    http::{
        HeaderName, HeaderValue,
        header::{REFERRER_POLICY, STRICT_TRANSPORT_SECURITY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS},
    },
    middleware::Next,
    response::Response,
};

/// Add security headers to all responses.
///
/// - `Strict-Transport-Security: max-age=31536000; includeSubDomains`
/// - `X-Frame-Options: SAMEORIGIN`
/// - `X-Content-Type-Options: nosniff`
/// - `Referrer-Policy: no-referrer`
/// - `Cross-Origin-Opener-Policy: same-origin`
/// - `Cross-Origin-Resource-Policy: cross-origin`
/// - `Origin-Agent-Cluster: ?1`
/// - `X-DNS-Prefetch-Control: off`
/// - `X-Download-Options: noopen`
/// - `X-Permitted-Cross-Domain-Policies: none`
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));

    for (name, value) in [
        ("cross-origin-opener-policy", "same-origin"),
        ("cross-origin-resource-policy", "cross-origin"),
        ("origin-agent-cluster", "?1"),
        ("x-dns-prefetch-control", "off"),
        ("x-download-options", "noopen"),
        ("x-permitted-cross-domain-policies", "none"),
    ] {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }

    response
}
