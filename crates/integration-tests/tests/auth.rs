//! Registration, login, profile and logout.
//!
//! These tests require a running API server with migrations applied.

use fk_designers_integration_tests::{base_url, client, login, register_customer, registration};
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_register_login_profile_logout() {
    let client = client();
    let (email, token, user_id) = register_customer(&client).await;

    let login_token = login(&client, &email.to_uppercase(), "secret123").await;
    assert!(login_token.is_some(), "login should be case-insensitive");

    let resp = client
        .get(format!("{}/api/auth/profile", base_url()))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to get profile");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to read response");
    assert_eq!(body["data"]["user_id"], user_id);
    assert_eq!(body["data"]["address_1"], "12 Linking Road, Bandra");
    assert!(body["data"].get("password_hash").is_none());

    let resp = client
        .post(format!("{}/api/auth/logout", base_url()))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to log out");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_duplicate_email_is_conflict() {
    let client = client();
    let (email, _, _) = register_customer(&client).await;

    let resp = client
        .post(format!("{}/api/auth/register", base_url()))
        .json(&registration(&email))
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_wrong_password_is_unauthorized() {
    let client = client();
    let (email, _, _) = register_customer(&client).await;

    let resp = client
        .post(format!("{}/api/auth/login", base_url()))
        .json(&json!({ "email": email, "password": "not-the-password" }))
        .send()
        .await
        .expect("Failed to log in");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.expect("Failed to read response");
    assert_eq!(body["success"], false);
}
