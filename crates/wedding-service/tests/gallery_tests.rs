//! Integration tests for the gallery endpoints.
//!
//! Uploads go through the real multipart path into the in-memory blob
//! store, so the tests check both the metadata rows and the stored objects.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::Result;
use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;
use wedding_test_utils::TestWeddingServer;

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nnot-really-a-png";

fn image_form(content_type: &str, caption: Option<&str>) -> Form {
    let part = Part::bytes(PNG_BYTES.to_vec())
        .file_name("photo.png")
        .mime_str(content_type)
        .unwrap();
    let form = Form::new().part("file", part);
    match caption {
        Some(caption) => form.text("caption", caption.to_string()),
        None => form,
    }
}

async fn upload(server: &TestWeddingServer, token: &str, form: Form) -> Result<reqwest::Response> {
    Ok(server
        .client()
        .post(format!("{}/api/v1/admin/gallery", server.url()))
        .bearer_auth(token)
        .multipart(form)
        .send()
        .await?)
}

async fn list(server: &TestWeddingServer) -> Result<Vec<Value>> {
    Ok(reqwest::get(format!("{}/api/v1/gallery", server.url()))
        .await?
        .json()
        .await?)
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_upload_appends_to_gallery(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool).await?;
    let token = server.admin_token().await?;

    let first = upload(&server, &token, image_form("image/png", Some("Le lac"))).await?;
    assert_eq!(first.status(), 201);
    let first: Value = first.json().await?;
    assert_eq!(first["displayOrder"], 0);
    assert_eq!(first["caption"], "Le lac");

    let second: Value = upload(&server, &token, image_form("image/png", None))
        .await?
        .json()
        .await?;
    assert_eq!(second["displayOrder"], 1);
    assert_eq!(second["caption"], "");

    let key = first["filename"].as_str().unwrap();
    assert!(key.starts_with("gallery/"));
    assert!(key.ends_with(".png"));
    let stored = server.store().get(key).unwrap();
    assert_eq!(stored.bytes.as_ref(), PNG_BYTES);
    assert_eq!(stored.content_type, "image/png");
    assert!(first["path"].as_str().unwrap().ends_with(key));

    assert_eq!(list(&server).await?.len(), 2);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_upload_rejects_unsupported_type(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool).await?;
    let token = server.admin_token().await?;

    let response = upload(&server, &token, image_form("application/pdf", None)).await?;

    assert_eq!(response.status(), 415);
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["code"], "UNSUPPORTED_MEDIA_TYPE");
    assert!(server.store().is_empty());
    assert!(list(&server).await?.is_empty());
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_upload_over_gallery_limit_is_rejected(pool: PgPool) -> Result<()> {
    let server =
        TestWeddingServer::spawn_with(pool, &[("GALLERY_MAX_UPLOAD_BYTES", "1024")]).await?;
    let token = server.admin_token().await?;

    let part = Part::bytes(vec![0u8; 1100])
        .file_name("big.png")
        .mime_str("image/png")?;
    let response = upload(&server, &token, Form::new().part("file", part)).await?;

    assert_eq!(response.status(), 413);
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");
    assert_eq!(server.store().put_count(), 0);
    assert!(list(&server).await?.is_empty());
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_upload_without_file_is_rejected(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool).await?;
    let token = server.admin_token().await?;

    let response = upload(&server, &token, Form::new().text("caption", "orphan")).await?;

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["code"], "MISSING_FILE");
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_upload_requires_admin(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool).await?;

    let response = server
        .client()
        .post(format!("{}/api/v1/admin/gallery", server.url()))
        .multipart(image_form("image/png", None))
        .send()
        .await?;

    assert_eq!(response.status(), 401);
    assert!(server.store().is_empty());
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_reorder_then_list_returns_new_order(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool).await?;
    let token = server.admin_token().await?;

    let mut ids = Vec::new();
    for _ in 0..3 {
        let image: Value = upload(&server, &token, image_form("image/png", None))
            .await?
            .json()
            .await?;
        ids.push(image["id"].as_str().unwrap().to_string());
    }
    ids.reverse();

    let response = server
        .client()
        .put(format!("{}/api/v1/admin/gallery/order", server.url()))
        .bearer_auth(&token)
        .json(&json!({ "ids": ids }))
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    let listed: Vec<String> = list(&server)
        .await?
        .iter()
        .map(|i| i["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(listed, ids);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_reorder_rejects_unknown_or_partial_lists(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool).await?;
    let token = server.admin_token().await?;

    let mut ids = Vec::new();
    for _ in 0..2 {
        let image: Value = upload(&server, &token, image_form("image/png", None))
            .await?
            .json()
            .await?;
        ids.push(image["id"].as_str().unwrap().to_string());
    }
    let url = format!("{}/api/v1/admin/gallery/order", server.url());

    let bodies = [
        json!({ "ids": [ids[1], Uuid::new_v4().to_string()] }),
        json!({ "ids": [ids[1]] }),
        json!({ "ids": [ids[1], ids[1]] }),
    ];
    for body in bodies {
        let response = server
            .client()
            .put(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;
        assert_eq!(response.status(), 400);
    }

    let listed: Vec<String> = list(&server)
        .await?
        .iter()
        .map(|i| i["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(listed, ids);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_update_caption(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool).await?;
    let token = server.admin_token().await?;

    let image: Value = upload(&server, &token, image_form("image/png", None))
        .await?
        .json()
        .await?;
    let url = format!(
        "{}/api/v1/admin/gallery/{}",
        server.url(),
        image["id"].as_str().unwrap()
    );

    let response = server
        .client()
        .patch(&url)
        .bearer_auth(&token)
        .json(&json!({ "caption": "La première danse" }))
        .send()
        .await?;
    assert_eq!(response.status(), 200);
    let updated: Value = response.json().await?;
    assert_eq!(updated["caption"], "La première danse");

    let response = server
        .client()
        .patch(&url)
        .bearer_auth(&token)
        .json(&json!({ "caption": "x".repeat(501) }))
        .send()
        .await?;
    assert_eq!(response.status(), 400);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_delete_removes_row_and_object(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool).await?;
    let token = server.admin_token().await?;

    let image: Value = upload(&server, &token, image_form("image/png", None))
        .await?
        .json()
        .await?;
    let key = image["filename"].as_str().unwrap();
    let url = format!(
        "{}/api/v1/admin/gallery/{}",
        server.url(),
        image["id"].as_str().unwrap()
    );

    let response = server.client().delete(&url).bearer_auth(&token).send().await?;
    assert_eq!(response.status(), 204);
    assert!(!server.store().contains(key));
    assert!(list(&server).await?.is_empty());

    let deletes_before = server.store().delete_count();
    let response = server.client().delete(&url).bearer_auth(&token).send().await?;
    assert_eq!(response.status(), 404);
    assert_eq!(server.store().delete_count(), deletes_before);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_delete_succeeds_when_storage_delete_fails(pool: PgPool) -> Result<()> {
    let server = TestWeddingServer::spawn(pool).await?;
    let token = server.admin_token().await?;

    let image: Value = upload(&server, &token, image_form("image/png", None))
        .await?
        .json()
        .await?;
    server.store().set_fail_deletes(true);

    let response = server
        .client()
        .delete(format!(
            "{}/api/v1/admin/gallery/{}",
            server.url(),
            image["id"].as_str().unwrap()
        ))
        .bearer_auth(&token)
        .send()
        .await?;

    assert_eq!(response.status(), 204);
    assert!(list(&server).await?.is_empty());
    assert!(server.store().contains(image["filename"].as_str().unwrap()));
    Ok(())
}
