//! Palette repository.
//!
//! The style token is derived from the stored hex value on every write;
//! clients never supply it.

use super::observe;
use crate::errors::WeddingError;
use crate::models::{
    style_token, CreatePaletteColorRequest, PaletteColorRow, UpdatePaletteColorRequest,
};
use sqlx::{PgPool, Row};
use std::time::Instant;
use tracing::instrument;
use uuid::Uuid;

const PALETTE_COLUMNS: &str = "id, name, value, style_token, created_at, updated_at";

/// Palette repository for database operations.
pub struct PaletteRepository;

impl PaletteRepository {
    /// List colors in the order they were added.
    #[instrument(skip_all, name = "wedding.repo.list_palette")]
    pub async fn list(pool: &PgPool) -> Result<Vec<PaletteColorRow>, WeddingError> {
        let start = Instant::now();
        let rows = sqlx::query(&format!(
            "SELECT {PALETTE_COLUMNS} FROM palette_colors ORDER BY created_at, id"
        ))
        .fetch_all(pool)
        .await;

        Ok(observe("list_palette", start, rows)?
            .iter()
            .map(map_row_to_color)
            .collect())
    }

    #[instrument(skip_all, name = "wedding.repo.create_palette_color")]
    pub async fn create(
        pool: &PgPool,
        req: &CreatePaletteColorRequest,
    ) -> Result<PaletteColorRow, WeddingError> {
        let value = req.value.trim();

        let start = Instant::now();
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO palette_colors (name, value, style_token)
            VALUES ($1, $2, $3)
            RETURNING {PALETTE_COLUMNS}
            "#
        ))
        .bind(req.name.trim())
        .bind(value)
        .bind(style_token(value))
        .fetch_one(pool)
        .await;

        Ok(map_row_to_color(&observe(
            "insert_palette_color",
            start,
            row,
        )?))
    }

    /// Apply a partial update; a new value also refreshes the style token.
    #[instrument(skip_all, name = "wedding.repo.update_palette_color", fields(color_id = %id))]
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        patch: &UpdatePaletteColorRequest,
    ) -> Result<Option<PaletteColorRow>, WeddingError> {
        let value = patch.value.as_deref().map(str::trim);

        let start = Instant::now();
        let row = sqlx::query(&format!(
            r#"
            UPDATE palette_colors SET
                name = COALESCE($2, name),
                value = COALESCE($3, value),
                style_token = COALESCE($4, style_token),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PALETTE_COLUMNS}
            "#
        ))
        .bind(id) // $1
        .bind(patch.name.as_deref().map(str::trim)) // $2
        .bind(value) // $3
        .bind(value.map(style_token)) // $4
        .fetch_optional(pool)
        .await;

        Ok(observe("update_palette_color", start, row)?
            .as_ref()
            .map(map_row_to_color))
    }

    #[instrument(skip_all, name = "wedding.repo.delete_palette_color", fields(color_id = %id))]
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, WeddingError> {
        let start = Instant::now();
        let result = sqlx::query("DELETE FROM palette_colors WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await;

        Ok(observe("delete_palette_color", start, result)?.rows_affected() > 0)
    }
}

fn map_row_to_color(row: &sqlx::postgres::PgRow) -> PaletteColorRow {
    PaletteColorRow {
        id: row.get("id"),
        name: row.get("name"),
        value: row.get("value"),
        style_token: row.get("style_token"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
