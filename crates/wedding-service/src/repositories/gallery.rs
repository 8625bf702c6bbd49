//! Gallery repository.
//!
//! Images are listed by `display_order`. New images are appended after the
//! current maximum; reordering rewrites every position in one statement.

use super::observe;
use crate::errors::WeddingError;
use crate::models::GalleryImageRow;
use sqlx::{PgPool, Row};
use std::collections::HashSet;
use std::time::Instant;
use tracing::instrument;
use uuid::Uuid;

const GALLERY_COLUMNS: &str = "id, filename, caption, display_order, path, created_at";

/// Gallery repository for database operations.
pub struct GalleryRepository;

impl GalleryRepository {
    /// List images in display order.
    #[instrument(skip_all, name = "wedding.repo.list_gallery")]
    pub async fn list(pool: &PgPool) -> Result<Vec<GalleryImageRow>, WeddingError> {
        let start = Instant::now();
        let rows = sqlx::query(&format!(
            "SELECT {GALLERY_COLUMNS} FROM gallery_images ORDER BY display_order, created_at, id"
        ))
        .fetch_all(pool)
        .await;

        Ok(observe("list_gallery", start, rows)?
            .iter()
            .map(map_row_to_image)
            .collect())
    }

    /// Register an uploaded image at the end of the gallery
    /// (`max(display_order) + 1`, or 0 for the first image).
    #[instrument(skip_all, name = "wedding.repo.insert_gallery_image")]
    pub async fn insert(
        pool: &PgPool,
        filename: &str,
        caption: &str,
        path: &str,
    ) -> Result<GalleryImageRow, WeddingError> {
        let start = Instant::now();
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO gallery_images (filename, caption, display_order, path)
            SELECT $1, $2, COALESCE(MAX(display_order) + 1, 0), $3
            FROM gallery_images
            RETURNING {GALLERY_COLUMNS}
            "#
        ))
        .bind(filename) // $1
        .bind(caption) // $2
        .bind(path) // $3
        .fetch_one(pool)
        .await;

        Ok(map_row_to_image(&observe(
            "insert_gallery_image",
            start,
            row,
        )?))
    }

    /// Replace an image caption. Returns `Ok(None)` if the image does not exist.
    #[instrument(skip_all, name = "wedding.repo.update_gallery_caption", fields(image_id = %id))]
    pub async fn update_caption(
        pool: &PgPool,
        id: Uuid,
        caption: &str,
    ) -> Result<Option<GalleryImageRow>, WeddingError> {
        let start = Instant::now();
        let row = sqlx::query(&format!(
            "UPDATE gallery_images SET caption = $2 WHERE id = $1 RETURNING {GALLERY_COLUMNS}"
        ))
        .bind(id)
        .bind(caption)
        .fetch_optional(pool)
        .await;

        Ok(observe("update_gallery_caption", start, row)?
            .as_ref()
            .map(map_row_to_image))
    }

    /// Set each image's `display_order` to its index in `ids`.
    ///
    /// `ids` must name every stored image exactly once; the check and the
    /// update share one transaction with the rows locked, so nothing is
    /// written when the list does not match.
    #[instrument(skip_all, name = "wedding.repo.reorder_gallery", fields(count = ids.len()))]
    pub async fn reorder(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<GalleryImageRow>, WeddingError> {
        let start = Instant::now();
        let mut tx = observe("begin_reorder_gallery", start, pool.begin().await)?;

        let start = Instant::now();
        let existing: Result<Vec<Uuid>, sqlx::Error> =
            sqlx::query_scalar("SELECT id FROM gallery_images FOR UPDATE")
                .fetch_all(&mut *tx)
                .await;
        let existing: HashSet<Uuid> = observe("lock_gallery", start, existing)?
            .into_iter()
            .collect();

        let requested: HashSet<Uuid> = ids.iter().copied().collect();
        if requested.len() != ids.len() {
            return Err(WeddingError::BadRequest(
                "Image ids must not contain duplicates".to_string(),
            ));
        }
        if let Some(unknown) = requested.difference(&existing).next() {
            return Err(WeddingError::BadRequest(format!(
                "Unknown gallery image id: {unknown}"
            )));
        }
        if requested.len() != existing.len() {
            return Err(WeddingError::BadRequest(
                "The new order must list every gallery image".to_string(),
            ));
        }

        let positions: Vec<i32> = (0..ids.len())
            .map(|i| i32::try_from(i).unwrap_or(i32::MAX))
            .collect();

        let start = Instant::now();
        let result = sqlx::query(
            r#"
            UPDATE gallery_images AS g
            SET display_order = o.position
            FROM UNNEST($1::uuid[], $2::int[]) AS o(id, position)
            WHERE g.id = o.id
            "#,
        )
        .bind(ids)
        .bind(&positions)
        .execute(&mut *tx)
        .await;
        observe("reorder_gallery", start, result)?;

        let start = Instant::now();
        let rows = sqlx::query(&format!(
            "SELECT {GALLERY_COLUMNS} FROM gallery_images ORDER BY display_order, created_at, id"
        ))
        .fetch_all(&mut *tx)
        .await;
        let images = observe("list_gallery", start, rows)?
            .iter()
            .map(map_row_to_image)
            .collect();

        let start = Instant::now();
        observe("commit_reorder_gallery", start, tx.commit().await)?;

        Ok(images)
    }

    /// Delete the metadata row, returning it so the caller can remove the
    /// stored object.
    #[instrument(skip_all, name = "wedding.repo.delete_gallery_image", fields(image_id = %id))]
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<Option<GalleryImageRow>, WeddingError> {
        let start = Instant::now();
        let row = sqlx::query(&format!(
            "DELETE FROM gallery_images WHERE id = $1 RETURNING {GALLERY_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await;

        Ok(observe("delete_gallery_image", start, row)?
            .as_ref()
            .map(map_row_to_image))
    }
}

fn map_row_to_image(row: &sqlx::postgres::PgRow) -> GalleryImageRow {
    GalleryImageRow {
        id: row.get("id"),
        filename: row.get("filename"),
        caption: row.get("caption"),
        display_order: row.get("display_order"),
        path: row.get("path"),
        created_at: row.get("created_at"),
    }
}
