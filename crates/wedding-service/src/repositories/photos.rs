//! Table photos repository.

use super::observe;
use crate::errors::WeddingError;
use crate::models::TablePhotoRow;
use sqlx::{PgPool, Row};
use std::time::Instant;
use tracing::instrument;
use uuid::Uuid;

const PHOTO_COLUMNS: &str = "id, table_number, image_url, storage_key, uploaded_by, \
     original_filename, file_size, file_type, uploaded_at";

/// Metadata of a stored guest photo.
#[derive(Debug, Clone)]
pub struct NewTablePhoto<'a> {
    pub table_number: i32,
    pub image_url: &'a str,
    pub storage_key: &'a str,
    pub uploaded_by: &'a str,
    pub original_filename: Option<&'a str>,
    pub file_size: i64,
    pub file_type: &'a str,
}

/// Table photos repository for database operations.
pub struct TablePhotosRepository;

impl TablePhotosRepository {
    #[instrument(skip_all, name = "wedding.repo.insert_table_photo", fields(table_number = new.table_number))]
    pub async fn insert(
        pool: &PgPool,
        new: &NewTablePhoto<'_>,
    ) -> Result<TablePhotoRow, WeddingError> {
        let start = Instant::now();
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO table_photos (
                table_number, image_url, storage_key, uploaded_by,
                original_filename, file_size, file_type
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PHOTO_COLUMNS}
            "#
        ))
        .bind(new.table_number) // $1
        .bind(new.image_url) // $2
        .bind(new.storage_key) // $3
        .bind(new.uploaded_by) // $4
        .bind(new.original_filename) // $5
        .bind(new.file_size) // $6
        .bind(new.file_type) // $7
        .fetch_one(pool)
        .await;

        Ok(map_row_to_photo(&observe(
            "insert_table_photo",
            start,
            row,
        )?))
    }

    /// Photos of one table, newest first.
    #[instrument(skip_all, name = "wedding.repo.list_table_photos", fields(table_number = table_number))]
    pub async fn list_for_table(
        pool: &PgPool,
        table_number: i32,
    ) -> Result<Vec<TablePhotoRow>, WeddingError> {
        Self::list(pool, Some(table_number)).await
    }

    /// All photos newest first, optionally restricted to one table.
    #[instrument(skip_all, name = "wedding.repo.list_photos")]
    pub async fn list(
        pool: &PgPool,
        table_number: Option<i32>,
    ) -> Result<Vec<TablePhotoRow>, WeddingError> {
        let start = Instant::now();
        let rows = sqlx::query(&format!(
            r#"
            SELECT {PHOTO_COLUMNS}
            FROM table_photos
            WHERE ($1::int IS NULL OR table_number = $1)
            ORDER BY uploaded_at DESC, id
            "#
        ))
        .bind(table_number)
        .fetch_all(pool)
        .await;

        Ok(observe("list_table_photos", start, rows)?
            .iter()
            .map(map_row_to_photo)
            .collect())
    }

    /// Delete the metadata row, returning it so the caller can remove the
    /// stored object.
    #[instrument(skip_all, name = "wedding.repo.delete_table_photo", fields(photo_id = %id))]
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<Option<TablePhotoRow>, WeddingError> {
        let start = Instant::now();
        let row = sqlx::query(&format!(
            "DELETE FROM table_photos WHERE id = $1 RETURNING {PHOTO_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await;

        Ok(observe("delete_table_photo", start, row)?
            .as_ref()
            .map(map_row_to_photo))
    }
}

fn map_row_to_photo(row: &sqlx::postgres::PgRow) -> TablePhotoRow {
    TablePhotoRow {
        id: row.get("id"),
        table_number: row.get("table_number"),
        image_url: row.get("image_url"),
        storage_key: row.get("storage_key"),
        uploaded_by: row.get("uploaded_by"),
        original_filename: row.get("original_filename"),
        file_size: row.get("file_size"),
        file_type: row.get("file_type"),
        uploaded_at: row.get("uploaded_at"),
    }
}
