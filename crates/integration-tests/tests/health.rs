//! Health, banner and fallback.
//!
//! These tests require a running API server with a reachable database.

use fk_designers_integration_tests::{base_url, client};
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_health_reports_database() {
    let resp = client()
        .get(format!("{}/health", base_url()))
        .send()
        .await
        .expect("Failed to get health");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to read response");
    assert_eq!(body["status"], "OK");
    assert_eq!(body["database"]["status"], "healthy");
    assert!(body["uptime_seconds"].is_u64());
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_unknown_endpoint_is_json_404() {
    let resp = client()
        .get(format!("{}/api/nothing-here", base_url()))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(resp.headers().contains_key("x-request-id"));
    let body: Value = resp.json().await.expect("Failed to read response");
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "API endpoint not found");
    assert_eq!(body["method"], "GET");
}
