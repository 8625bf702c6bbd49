//! Integration tests for the RSVP endpoints.
//!
//! Covers the public form, the admin listing and summary, partial updates
//! that replace the guest list, and the transactional delete of an RSVP
//! with its guests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::Result;
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;
use wedding_test_utils::TestWeddingServer;

async fn submit(server: &TestWeddingServer, body: Value) -> Result<reqwest::Response> {
    Ok(server
        .client()
        .post(format!("{}/api/v1/rsvps", server.url()))
        .json(&body)
        .send()
        .await?)
}

async fn table_count(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Make every `op` (INSERT or DELETE) on `rsvp_guests` raise.
async fn fail_guest_writes(pool: &PgPool, op: &str) {
    sqlx::query(
        r#"
        CREATE FUNCTION reject_guest_write() RETURNS trigger AS $$
        BEGIN
            RAISE EXCEPTION 'guest writes disabled';
        END;
        $$ LANGUAGE plpgsql
        "#,
    )
    .execute(pool)
    .await
    .unwrap();
    sqlx::query(&format!(
        "CREATE TRIGGER reject_guest_write BEFORE {op} ON rsvp_guests \
         FOR EACH ROW EXECUTE FUNCTION reject_guest_write()"
    ))
    .execute(pool)
    .await
    .unwrap();
}

async fn guest_count(pool: &PgPool, rsvp_id: Uuid) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM rsvp_guests WHERE rsvp_id = $1")
        .bind(rsvp_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_create_rsvp_with_guests(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool).await?;

    let response = submit(
        &server,
        json!({
            "name": "Camille Martin",
            "email": "camille@example.com",
            "phone": "+33 6 12 34 56 78",
            "attending": true,
            "message": "Hâte d'y être !",
            "guestNames": ["Louis Martin", "  Jeanne Martin  ", ""]
        }),
    )
    .await?;
    assert_eq!(response.status(), 201);

    let created: Value = response.json().await?;
    assert_eq!(created["name"], "Camille Martin");
    assert_eq!(created["partySize"], 3);
    assert_eq!(created["guestNames"], json!(["Louis Martin", "Jeanne Martin"]));

    let token = server.admin_token().await?;
    let listed: Vec<Value> = server
        .client()
        .get(format!("{}/api/v1/admin/rsvps", server.url()))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], created["id"]);
    assert_eq!(listed[0]["guestNames"], created["guestNames"]);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_create_rsvp_missing_name_is_rejected(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool.clone()).await?;

    let response = submit(&server, json!({ "email": "someone@example.com" })).await?;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let response = submit(&server, json!({ "name": "   ", "email": "someone@example.com" })).await?;
    assert_eq!(response.status(), 400);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rsvps")
        .fetch_one(&pool)
        .await?;
    assert_eq!(count, 0);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_create_rsvp_rejects_inconsistent_party(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool.clone()).await?;

    // Two guests cannot fit in a party of two (respondent included)
    let response = submit(
        &server,
        json!({
            "name": "Hugo",
            "email": "hugo@example.com",
            "partySize": 2,
            "guestNames": ["A", "B"]
        }),
    )
    .await?;
    assert_eq!(response.status(), 400);

    // Not attending with guests
    let response = submit(
        &server,
        json!({
            "name": "Inès",
            "email": "ines@example.com",
            "attending": false,
            "guestNames": ["C"]
        }),
    )
    .await?;
    assert_eq!(response.status(), 400);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rsvps")
        .fetch_one(&pool)
        .await?;
    assert_eq!(count, 0);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_create_rsvp_rejects_malformed_json(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool).await?;

    let response = server
        .client()
        .post(format!("{}/api/v1/rsvps", server.url()))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_create_rsvp_rejects_wrong_content_type(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool.clone()).await?;

    let response = server
        .client()
        .post(format!("{}/api/v1/rsvps", server.url()))
        .header("content-type", "text/plain")
        .body(r#"{"name":"Léa","email":"lea@example.com"}"#)
        .send()
        .await?;

    assert_eq!(response.status(), 415);
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["code"], "UNSUPPORTED_MEDIA_TYPE");
    assert_eq!(
        body["error"]["message"],
        "Expected Content-Type: application/json"
    );
    assert_eq!(table_count(&pool, "rsvps").await, 0);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_create_rsvp_is_atomic_when_guest_insert_fails(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool.clone()).await?;
    fail_guest_writes(&pool, "INSERT").await;

    let response = submit(
        &server,
        json!({
            "name": "Éloïse",
            "email": "eloise@example.com",
            "guestNames": ["Bastien"]
        }),
    )
    .await?;

    assert_eq!(response.status(), 500);
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["code"], "DATABASE_ERROR");
    assert_eq!(table_count(&pool, "rsvps").await, 0);
    assert_eq!(table_count(&pool, "rsvp_guests").await, 0);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_delete_rsvp_keeps_parent_when_guest_delete_fails(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool.clone()).await?;

    let created: Value = submit(
        &server,
        json!({
            "name": "Gaspard",
            "email": "gaspard@example.com",
            "guestNames": ["Margot", "Théo"]
        }),
    )
    .await?
    .json()
    .await?;
    let id: Uuid = created["id"].as_str().unwrap().parse()?;

    fail_guest_writes(&pool, "DELETE").await;

    let token = server.admin_token().await?;
    let response = server
        .client()
        .delete(format!("{}/api/v1/admin/rsvps/{}", server.url(), id))
        .bearer_auth(&token)
        .send()
        .await?;

    assert_eq!(response.status(), 500);
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["code"], "DATABASE_ERROR");
    assert_eq!(table_count(&pool, "rsvps").await, 1);
    assert_eq!(guest_count(&pool, id).await, 2);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_delete_rsvp_removes_all_guests(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool.clone()).await?;

    let created: Value = submit(
        &server,
        json!({
            "name": "Lucie",
            "email": "lucie@example.com",
            "guestNames": ["G1", "G2", "G3"]
        }),
    )
    .await?
    .json()
    .await?;
    let id: Uuid = created["id"].as_str().unwrap().parse()?;
    assert_eq!(guest_count(&pool, id).await, 3);

    let token = server.admin_token().await?;
    let url = format!("{}/api/v1/admin/rsvps/{}", server.url(), id);

    let response = server.client().delete(&url).bearer_auth(&token).send().await?;
    assert_eq!(response.status(), 204);
    assert_eq!(guest_count(&pool, id).await, 0);

    let response = server.client().delete(&url).bearer_auth(&token).send().await?;
    assert_eq!(response.status(), 404);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_delete_unknown_rsvp_is_not_found(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool).await?;
    let token = server.admin_token().await?;

    let response = server
        .client()
        .delete(format!("{}/api/v1/admin/rsvps/{}", server.url(), Uuid::new_v4()))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(response.status(), 404);

    let response = server
        .client()
        .delete(format!("{}/api/v1/admin/rsvps/not-a-uuid", server.url()))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(response.status(), 400);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_update_unknown_rsvp_is_not_found(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool).await?;
    let token = server.admin_token().await?;

    let response = server
        .client()
        .patch(format!("{}/api/v1/admin/rsvps/{}", server.url(), Uuid::new_v4()))
        .bearer_auth(&token)
        .json(&json!({ "message": "À bientôt" }))
        .send()
        .await?;

    assert_eq!(response.status(), 404);
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_update_rsvp_replaces_guests(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool.clone()).await?;

    let created: Value = submit(
        &server,
        json!({ "name": "Marc", "email": "marc@example.com", "guestNames": ["Old"] }),
    )
    .await?
    .json()
    .await?;
    let id: Uuid = created["id"].as_str().unwrap().parse()?;

    let token = server.admin_token().await?;
    let response = server
        .client()
        .patch(format!("{}/api/v1/admin/rsvps/{}", server.url(), id))
        .bearer_auth(&token)
        .json(&json!({ "guestNames": ["New One", "New Two"], "phone": "" }))
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    let updated: Value = response.json().await?;
    assert_eq!(updated["guestNames"], json!(["New One", "New Two"]));
    assert_eq!(updated["partySize"], 3);
    assert_eq!(updated["phone"], Value::Null);
    assert_eq!(guest_count(&pool, id).await, 2);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_update_rsvp_rejects_guests_when_declining(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool.clone()).await?;

    let created: Value = submit(
        &server,
        json!({ "name": "Nina", "email": "nina@example.com", "guestNames": ["Paul"] }),
    )
    .await?
    .json()
    .await?;
    let id: Uuid = created["id"].as_str().unwrap().parse()?;

    let token = server.admin_token().await?;
    let response = server
        .client()
        .patch(format!("{}/api/v1/admin/rsvps/{}", server.url(), id))
        .bearer_auth(&token)
        .json(&json!({ "attending": false, "partySize": 0 }))
        .send()
        .await?;
    assert_eq!(response.status(), 400);
    assert_eq!(guest_count(&pool, id).await, 1);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_summary_counts_match_stored_rsvps(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool).await?;

    submit(
        &server,
        json!({ "name": "A", "email": "a@example.com", "guestNames": ["A2"] }),
    )
    .await?;
    submit(&server, json!({ "name": "B", "email": "b@example.com" })).await?;
    submit(
        &server,
        json!({ "name": "C", "email": "c@example.com", "attending": false }),
    )
    .await?;

    let token = server.admin_token().await?;
    let summary: Value = server
        .client()
        .get(format!("{}/api/v1/admin/rsvps/summary", server.url()))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(summary["totalResponses"], 3);
    assert_eq!(summary["attending"], 2);
    assert_eq!(summary["notAttending"], 1);
    assert_eq!(summary["totalGuests"], 3);
    Ok(())
}
