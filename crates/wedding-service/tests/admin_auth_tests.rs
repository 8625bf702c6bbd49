//! Integration tests for admin sign-in and bearer token enforcement.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use anyhow::Result;
use common::jwt::SessionKeys;
use common::secret::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use sqlx::PgPool;
use wedding_test_utils::{TestWeddingServer, TEST_ADMIN_PASSWORD, TEST_SESSION_SECRET};

async fn get_rsvps(server: &TestWeddingServer, token: Option<&str>) -> Result<reqwest::Response> {
    let mut request = server
        .client()
        .get(format!("{}/api/v1/admin/rsvps", server.url()));
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    Ok(request.send().await?)
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_login_issues_bearer_token(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool).await?;

    let response = server
        .client()
        .post(format!("{}/api/v1/admin/session", server.url()))
        .json(&json!({ "password": TEST_ADMIN_PASSWORD }))
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await?;
    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["expiresIn"], server.config().admin_session_ttl_seconds);
    let token = body["accessToken"].as_str().unwrap();

    let response = get_rsvps(&server, Some(token)).await?;
    assert_eq!(response.status(), 200);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_wrong_password_is_rejected(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool).await?;

    for password in ["not-the-password", ""] {
        let response = server
            .client()
            .post(format!("{}/api/v1/admin/session", server.url()))
            .json(&json!({ "password": password }))
            .send()
            .await?;
        assert_eq!(response.status(), 401);
        let body: Value = response.json().await?;
        assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");
        assert!(body.get("accessToken").is_none());
    }
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_missing_token_is_challenged(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool).await?;

    let response = get_rsvps(&server, None).await?;

    assert_eq!(response.status(), 401);
    let challenge = response
        .headers()
        .get("www-authenticate")
        .unwrap()
        .to_str()?
        .to_string();
    assert!(challenge.starts_with("Bearer"));
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_malformed_authorization_header_is_rejected(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool).await?;

    let response = server
        .client()
        .get(format!("{}/api/v1/admin/rsvps", server.url()))
        .header("authorization", format!("Basic {TEST_ADMIN_PASSWORD}"))
        .send()
        .await?;
    assert_eq!(response.status(), 401);

    let response = get_rsvps(&server, Some("not.a.jwt")).await?;
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_expired_token_is_rejected(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool).await?;

    let keys = SessionKeys::from_secret(
        &SecretString::from(TEST_SESSION_SECRET),
        Duration::from_secs(60),
    );
    let issued = keys.issue_at(chrono::Utc::now().timestamp() - 3600)?;

    let response = get_rsvps(&server, Some(issued.token.expose_secret())).await?;

    assert_eq!(response.status(), 401);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_token_from_other_secret_is_rejected(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool).await?;

    let keys = SessionKeys::from_secret(
        &SecretString::from("some-other-secret-that-is-long-enough-too"),
        Duration::from_secs(3600),
    );
    let issued = keys.issue()?;

    let response = get_rsvps(&server, Some(issued.token.expose_secret())).await?;

    assert_eq!(response.status(), 401);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_public_routes_need_no_token(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool).await?;

    for path in [
        "/api/v1/gallery",
        "/api/v1/palette",
        "/api/v1/witnesses",
        "/api/v1/contacts",
        "/api/v1/tables/1/photos",
    ] {
        let response = reqwest::get(format!("{}{}", server.url(), path)).await?;
        assert_eq!(response.status(), 200, "{path} should be public");
    }
    Ok(())
}
