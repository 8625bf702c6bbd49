//! Witnesses repository.

use super::{clearable, observe};
use crate::errors::WeddingError;
use crate::models::{CreateWitnessRequest, Side, UpdateWitnessRequest, WitnessRow};
use sqlx::{PgPool, Row};
use std::time::Instant;
use tracing::instrument;
use uuid::Uuid;

const WITNESS_COLUMNS: &str = "id, name, side, phone, email, photo, created_at, updated_at";

/// Witnesses repository for database operations.
pub struct WitnessesRepository;

impl WitnessesRepository {
    /// List witnesses, most recently added first.
    #[instrument(skip_all, name = "wedding.repo.list_witnesses")]
    pub async fn list(pool: &PgPool) -> Result<Vec<WitnessRow>, WeddingError> {
        let start = Instant::now();
        let rows = sqlx::query(&format!(
            "SELECT {WITNESS_COLUMNS} FROM witnesses ORDER BY created_at DESC, id"
        ))
        .fetch_all(pool)
        .await;

        Ok(observe("list_witnesses", start, rows)?
            .iter()
            .map(map_row_to_witness)
            .collect())
    }

    /// Insert a validated witness.
    #[instrument(skip_all, name = "wedding.repo.create_witness")]
    pub async fn create(
        pool: &PgPool,
        req: &CreateWitnessRequest,
    ) -> Result<WitnessRow, WeddingError> {
        let side = Side::parse(&req.side)
            .ok_or_else(|| WeddingError::BadRequest("Side must be 'bride' or 'groom'".to_string()))?;

        let start = Instant::now();
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO witnesses (name, side, phone, email, photo)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {WITNESS_COLUMNS}
            "#
        ))
        .bind(req.name.trim()) // $1
        .bind(side.as_str()) // $2
        .bind(req.phone.trim()) // $3
        .bind(req.email.trim()) // $4
        .bind(clearable(req.photo.as_deref()).flatten()) // $5
        .fetch_one(pool)
        .await;

        Ok(map_row_to_witness(&observe("insert_witness", start, row)?))
    }

    /// Apply a partial update. Returns `Ok(None)` if the witness does not exist.
    #[instrument(skip_all, name = "wedding.repo.update_witness", fields(witness_id = %id))]
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        patch: &UpdateWitnessRequest,
    ) -> Result<Option<WitnessRow>, WeddingError> {
        let side = match &patch.side {
            Some(side) => Some(Side::parse(side).ok_or_else(|| {
                WeddingError::BadRequest("Side must be 'bride' or 'groom'".to_string())
            })?),
            None => None,
        };
        let photo = clearable(patch.photo.as_deref());

        let start = Instant::now();
        let row = sqlx::query(&format!(
            r#"
            UPDATE witnesses SET
                name = COALESCE($2, name),
                side = COALESCE($3, side),
                phone = COALESCE($4, phone),
                email = COALESCE($5, email),
                photo = CASE WHEN $6 THEN $7 ELSE photo END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {WITNESS_COLUMNS}
            "#
        ))
        .bind(id) // $1
        .bind(patch.name.as_deref().map(str::trim)) // $2
        .bind(side.map(|s| s.as_str())) // $3
        .bind(patch.phone.as_deref().map(str::trim)) // $4
        .bind(patch.email.as_deref().map(str::trim)) // $5
        .bind(photo.is_some()) // $6
        .bind(photo.flatten()) // $7
        .fetch_optional(pool)
        .await;

        Ok(observe("update_witness", start, row)?
            .as_ref()
            .map(map_row_to_witness))
    }

    /// Delete a witness. Returns false if it did not exist.
    #[instrument(skip_all, name = "wedding.repo.delete_witness", fields(witness_id = %id))]
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, WeddingError> {
        let start = Instant::now();
        let result = sqlx::query("DELETE FROM witnesses WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await;

        Ok(observe("delete_witness", start, result)?.rows_affected() > 0)
    }
}

fn map_row_to_witness(row: &sqlx::postgres::PgRow) -> WitnessRow {
    WitnessRow {
        id: row.get("id"),
        name: row.get("name"),
        side: row.get("side"),
        phone: row.get("phone"),
        email: row.get("email"),
        photo: row.get("photo"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
