//! Integration tests for the palette endpoints.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::Result;
use serde_json::{json, Value};
use sqlx::PgPool;
use wedding_test_utils::TestWeddingServer;

async fn add_color(
    server: &TestWeddingServer,
    token: &str,
    name: &str,
    value: &str,
) -> Result<reqwest::Response> {
    Ok(server
        .client()
        .post(format!("{}/api/v1/admin/palette", server.url()))
        .bearer_auth(token)
        .json(&json!({ "name": name, "value": value }))
        .send()
        .await?)
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_hex_values_are_validated(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool).await?;
    let token = server.admin_token().await?;

    for value in ["#A1B2C3", "#fff"] {
        let response = add_color(&server, &token, "Ok", value).await?;
        assert_eq!(response.status(), 201, "{value} should be accepted");
    }

    for value in ["red", "#12", "#12345", "A1B2C3", "#GGGGGG", ""] {
        let response = add_color(&server, &token, "Bad", value).await?;
        assert_eq!(response.status(), 400, "{value} should be rejected");
    }

    let listed: Vec<Value> = reqwest::get(format!("{}/api/v1/palette", server.url()))
        .await?
        .json()
        .await?;
    assert_eq!(listed.len(), 2);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_style_token_follows_value(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool).await?;
    let token = server.admin_token().await?;

    let created: Value = add_color(&server, &token, "Sage", "#9CAF88")
        .await?
        .json()
        .await?;
    assert_eq!(created["styleToken"], "bg-[#9CAF88]");

    let id = created["id"].as_str().unwrap();
    let response = server
        .client()
        .patch(format!("{}/api/v1/admin/palette/{}", server.url(), id))
        .bearer_auth(&token)
        .json(&json!({ "value": "#D4AF37" }))
        .send()
        .await?;
    assert_eq!(response.status(), 200);
    let updated: Value = response.json().await?;
    assert_eq!(updated["name"], "Sage");
    assert_eq!(updated["styleToken"], "bg-[#D4AF37]");

    let response = server
        .client()
        .patch(format!("{}/api/v1/admin/palette/{}", server.url(), id))
        .bearer_auth(&token)
        .json(&json!({ "styleToken": "bg-[red]" }))
        .send()
        .await?;
    assert_eq!(response.status(), 400);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_delete_palette_color(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool).await?;
    let token = server.admin_token().await?;

    let created: Value = add_color(&server, &token, "Ivoire", "#FFFFF0")
        .await?
        .json()
        .await?;
    let url = format!(
        "{}/api/v1/admin/palette/{}",
        server.url(),
        created["id"].as_str().unwrap()
    );

    let response = server.client().delete(&url).bearer_auth(&token).send().await?;
    assert_eq!(response.status(), 204);

    let response = server.client().delete(&url).bearer_auth(&token).send().await?;
    assert_eq!(response.status(), 404);
    Ok(())
}
