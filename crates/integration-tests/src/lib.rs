//! Integration tests for the FK Designers API.
//!
//! # Running Tests
//!
//! ```bash
//! # Start PostgreSQL, apply migrations and run the server
//! fkd-cli migrate
//! cargo run -p fk-designers-api
//!
//! # Run the ignored HTTP tests against it
//! cargo test -p fk-designers-integration-tests -- --ignored
//! ```
//!
//! Staff and admin scenarios additionally need `FKD_TEST_ADMIN_EMAIL` and
//! `FKD_TEST_ADMIN_PASSWORD` for an existing admin account (for example the
//! one ensured from `ADMIN_EMAIL`/`ADMIN_PASSWORD` at server start).

use reqwest::Client;
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL of the API under test (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("FKD_API_URL")
        .unwrap_or_else(|_| "http://localhost:10000".to_string())
        .trim_end_matches('/')
        .to_string()
}

/// A plain HTTP client.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .build()
        .expect("Failed to create HTTP client")
}

/// An email no earlier run has registered.
#[must_use]
pub fn unique_email() -> String {
    format!("it-{}@example.com", Uuid::new_v4().simple())
}

/// A valid registration body for `email`.
#[must_use]
pub fn registration(email: &str) -> Value {
    json!({
        "first_name": "Test",
        "last_name": "Customer",
        "email": email,
        "phone": "9876543210",
        "password": "secret123",
        "address_1": "12 Linking Road, Bandra"
    })
}

/// Register a fresh customer and return `(email, token, user_id)`.
///
/// # Panics
///
/// Panics if registration does not answer 201 with a token.
pub async fn register_customer(client: &Client) -> (String, String, i64) {
    let email = unique_email();
    let resp = client
        .post(format!("{}/api/auth/register", base_url()))
        .json(&registration(&email))
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(resp.status(), reqwest::StatusCode::CREATED);

    let body: Value = resp.json().await.expect("Failed to read response");
    let token = body["data"]["token"]
        .as_str()
        .expect("token missing")
        .to_string();
    let user_id = body["data"]["user"]["user_id"]
        .as_i64()
        .expect("user_id missing");
    (email, token, user_id)
}

/// Log in and return the bearer token, or `None` on a non-200 answer.
///
/// # Panics
///
/// Panics if the server cannot be reached.
pub async fn login(client: &Client, email: &str, password: &str) -> Option<String> {
    let resp = client
        .post(format!("{}/api/auth/login", base_url()))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to log in");
    if !resp.status().is_success() {
        return None;
    }
    let body: Value = resp.json().await.ok()?;
    body["data"]["token"].as_str().map(String::from)
}

/// Token for the admin named by `FKD_TEST_ADMIN_EMAIL`/`FKD_TEST_ADMIN_PASSWORD`.
///
/// # Panics
///
/// Panics if the variables are unset or the login fails.
pub async fn admin_token(client: &Client) -> String {
    let email = std::env::var("FKD_TEST_ADMIN_EMAIL").expect("FKD_TEST_ADMIN_EMAIL not set");
    let password =
        std::env::var("FKD_TEST_ADMIN_PASSWORD").expect("FKD_TEST_ADMIN_PASSWORD not set");
    login(client, &email, &password)
        .await
        .expect("Admin login failed")
}
