//! Integration tests for guest table photos.
//!
//! Covers the public upload and per-table listing, size and type limits,
//! compensation when the metadata insert fails after the object was
//! stored, and the admin listing and delete.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::Result;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use sqlx::PgPool;
use wedding_test_utils::TestWeddingServer;

fn photo_form(bytes: Vec<u8>, content_type: &str, table: &str) -> Form {
    let part = Part::bytes(bytes)
        .file_name("IMG_0042.jpg")
        .mime_str(content_type)
        .unwrap();
    Form::new().part("file", part).text("tableNumber", table.to_string())
}

async fn upload(server: &TestWeddingServer, form: Form) -> Result<reqwest::Response> {
    Ok(server
        .client()
        .post(format!("{}/api/v1/photos/upload", server.url()))
        .multipart(form)
        .send()
        .await?)
}

async fn photo_rows(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM table_photos")
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_guest_upload_and_table_listing(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool).await?;

    let form = photo_form(vec![0xFF, 0xD8, 0xFF, 0xE0], "image/jpeg", "7")
        .text("uploadedBy", "  Tante Odile ");
    let response = upload(&server, form).await?;
    assert_eq!(response.status(), 201);

    let photo: Value = response.json().await?;
    assert_eq!(photo["tableNumber"], 7);
    assert_eq!(photo["uploadedBy"], "Tante Odile");
    assert_eq!(photo["originalFilename"], "IMG_0042.jpg");
    assert_eq!(photo["fileSize"], 4);
    assert_eq!(photo["fileType"], "image/jpeg");
    assert!(photo.get("storageKey").is_none());

    let anonymous: Value = upload(&server, photo_form(vec![1, 2, 3], "image/webp", "7"))
        .await?
        .json()
        .await?;
    assert_eq!(anonymous["uploadedBy"], "guest");

    upload(&server, photo_form(vec![1], "image/png", "8")).await?;

    let table_seven: Vec<Value> =
        reqwest::get(format!("{}/api/v1/tables/7/photos", server.url()))
            .await?
            .json()
            .await?;
    assert_eq!(table_seven.len(), 2);
    assert!(table_seven.iter().all(|p| p["tableNumber"] == 7));
    assert_eq!(server.store().len(), 3);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_table_number_is_validated(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool.clone()).await?;

    for table in ["0", "51", "seven", ""] {
        let response = upload(&server, photo_form(vec![1], "image/jpeg", table)).await?;
        assert_eq!(response.status(), 400, "table {table:?} should be rejected");
    }

    let response = reqwest::get(format!("{}/api/v1/tables/0/photos", server.url())).await?;
    assert_eq!(response.status(), 400);

    assert_eq!(photo_rows(&pool).await, 0);
    assert!(server.store().is_empty());
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_oversized_upload_is_rejected(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn_with(pool.clone(), &[("PHOTO_MAX_UPLOAD_BYTES", "1024")])
        .await?;

    let response = upload(&server, photo_form(vec![7; 1100], "image/jpeg", "3")).await?;

    assert_eq!(response.status(), 413);
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");
    assert_eq!(photo_rows(&pool).await, 0);
    assert!(server.store().is_empty());
    assert_eq!(server.store().put_count(), 0);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_upload_at_exact_limit_is_accepted(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn_with(pool, &[("PHOTO_MAX_UPLOAD_BYTES", "1024")]).await?;

    let response = upload(&server, photo_form(vec![7; 1024], "image/jpeg", "3")).await?;

    assert_eq!(response.status(), 201);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_pdf_upload_is_unsupported(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool.clone()).await?;

    let response = upload(&server, photo_form(b"%PDF-1.7".to_vec(), "application/pdf", "1")).await?;

    assert_eq!(response.status(), 415);
    assert_eq!(photo_rows(&pool).await, 0);
    assert!(server.store().is_empty());
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_storage_failure_registers_nothing(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool.clone()).await?;
    server.store().set_fail_puts(true);

    let response = upload(&server, photo_form(vec![1, 2], "image/jpeg", "2")).await?;

    assert_eq!(response.status(), 502);
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["code"], "STORAGE_ERROR");
    assert_eq!(photo_rows(&pool).await, 0);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_metadata_failure_removes_stored_object(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool.clone()).await?;

    sqlx::query("DROP TABLE table_photos").execute(&pool).await?;

    let response = upload(&server, photo_form(vec![1, 2, 3], "image/jpeg", "4")).await?;

    assert_eq!(response.status(), 500);
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["code"], "DATABASE_ERROR");
    assert_eq!(server.store().put_count(), 1);
    assert_eq!(server.store().delete_count(), 1);
    assert!(server.store().is_empty());
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_admin_listing_and_delete(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool).await?;
    let token = server.admin_token().await?;

    upload(&server, photo_form(vec![1], "image/jpeg", "1")).await?;
    let second: Value = upload(&server, photo_form(vec![2], "image/jpeg", "2"))
        .await?
        .json()
        .await?;

    let response = server
        .client()
        .get(format!("{}/api/v1/admin/photos", server.url()))
        .send()
        .await?;
    assert_eq!(response.status(), 401);

    let all: Vec<Value> = server
        .client()
        .get(format!("{}/api/v1/admin/photos", server.url()))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(all.len(), 2);

    let filtered: Vec<Value> = server
        .client()
        .get(format!("{}/api/v1/admin/photos?table=2", server.url()))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["id"], second["id"]);

    let url = format!(
        "{}/api/v1/admin/photos/{}",
        server.url(),
        second["id"].as_str().unwrap()
    );
    let response = server.client().delete(&url).bearer_auth(&token).send().await?;
    assert_eq!(response.status(), 204);
    assert_eq!(server.store().len(), 1);

    let response = server.client().delete(&url).bearer_auth(&token).send().await?;
    assert_eq!(response.status(), 404);
    Ok(())
}
