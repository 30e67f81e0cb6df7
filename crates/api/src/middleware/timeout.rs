//! Whole-request deadline.

use std::time::Duration;

use axum::{
    Json,
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::request_id::RequestId;
use crate::error::ErrorBody;

/// Deadline for a request, handler and body write included.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Answer 408 with the JSON envelope when the inner service runs past
/// [`REQUEST_TIMEOUT`]. The dropped handler future releases any pooled
/// connection it held.
pub async fn request_timeout_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request.extensions().get::<RequestId>().cloned();
    match tokio::time::timeout(REQUEST_TIMEOUT, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(
                %method,
                %uri,
                request_id = request_id.as_ref().map(|id| id.0.as_str()),
                "Request timed out"
            );
            timed_out()
        }
    }
}

fn timed_out() -> Response {
    (
        StatusCode::REQUEST_TIMEOUT,
        Json(ErrorBody::new("Request timeout")),
    )
        .into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_timed_out_body() {
        let response = timed_out();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Request timeout");
    }
}
