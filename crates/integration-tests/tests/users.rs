//! Staff and admin user management.

use fk_designers_integration_tests::{
    admin_token, base_url, client, login, register_customer,
};
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_customer_cannot_list_customers() {
    let client = client();
    let (_, token, _) = register_customer(&client).await;

    let resp = client
        .get(format!("{}/api/users/customers", base_url()))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running API server and admin credentials"]
async fn test_deactivated_user_cannot_log_in() {
    let client = client();
    let admin = admin_token(&client).await;
    let (email, customer_token, user_id) = register_customer(&client).await;
    let base_url = base_url();

    let resp = client
        .patch(format!("{base_url}/api/users/{user_id}/status"))
        .bearer_auth(&admin)
        .json(&json!({ "is_active": false }))
        .send()
        .await
        .expect("Failed to update status");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to read response");
    assert_eq!(body["message"], "User deactivated successfully");

    assert!(login(&client, &email, "secret123").await.is_none());

    let resp = client
        .get(format!("{base_url}/api/auth/profile"))
        .bearer_auth(&customer_token)
        .send()
        .await
        .expect("Failed to get profile");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = client
        .get(format!(
            "{base_url}/api/users/audit-logs?action=update_user_status&limit=5"
        ))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to get audit logs");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to read response");
    assert_eq!(body["data"]["logs"][0]["details"]["target_user_id"], user_id);
}

#[tokio::test]
#[ignore = "Requires running API server and admin credentials"]
async fn test_status_requires_boolean() {
    let client = client();
    let admin = admin_token(&client).await;

    let resp = client
        .patch(format!("{}/api/users/1/status", base_url()))
        .bearer_auth(&admin)
        .json(&json!({ "is_active": "yes" }))
        .send()
        .await
        .expect("Failed to update status");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
