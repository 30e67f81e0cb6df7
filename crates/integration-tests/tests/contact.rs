//! Public contact and customization forms.

use fk_designers_integration_tests::{base_url, client};
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_contact_inquiry_created() {
    let resp = client()
        .post(format!("{}/api/contact/contact", base_url()))
        .json(&json!({
            "name": "Meera",
            "email": "meera@example.com",
            "subject": "Store hours",
            "message": "Are you open on Sunday afternoons?"
        }))
        .send()
        .await
        .expect("Failed to submit inquiry");

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.expect("Failed to read response");
    assert!(body["data"]["inquiry_id"].is_i64());
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_customization_rejects_unknown_service() {
    let resp = client()
        .post(format!("{}/api/contact/customization", base_url()))
        .json(&json!({
            "name": "Meera",
            "email": "meera@example.com",
            "phone": "9876543210",
            "serviceType": "dry-cleaning",
            "description": "Please dry clean my sherwani"
        }))
        .send()
        .await
        .expect("Failed to submit request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to read response");
    assert_eq!(body["errors"][0]["field"], "serviceType");
}
