//! Contacts repository.

use super::observe;
use crate::errors::WeddingError;
use crate::models::{ContactRow, CreateContactRequest, Side, UpdateContactRequest};
use sqlx::{PgPool, Row};
use std::time::Instant;
use tracing::instrument;
use uuid::Uuid;

const CONTACT_COLUMNS: &str = "id, name, side, phone, email, created_at, updated_at";

/// Contacts repository for database operations.
pub struct ContactsRepository;

impl ContactsRepository {
    /// List contacts, bride's side first, then by name.
    #[instrument(skip_all, name = "wedding.repo.list_contacts")]
    pub async fn list(pool: &PgPool) -> Result<Vec<ContactRow>, WeddingError> {
        let start = Instant::now();
        let rows = sqlx::query(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts ORDER BY side, name, id"
        ))
        .fetch_all(pool)
        .await;

        Ok(observe("list_contacts", start, rows)?
            .iter()
            .map(map_row_to_contact)
            .collect())
    }

    #[instrument(skip_all, name = "wedding.repo.create_contact")]
    pub async fn create(
        pool: &PgPool,
        req: &CreateContactRequest,
    ) -> Result<ContactRow, WeddingError> {
        let side = parse_side(&req.side)?;

        let start = Instant::now();
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO contacts (name, side, phone, email)
            VALUES ($1, $2, $3, $4)
            RETURNING {CONTACT_COLUMNS}
            "#
        ))
        .bind(req.name.trim())
        .bind(side.as_str())
        .bind(req.phone.trim())
        .bind(req.email.trim())
        .fetch_one(pool)
        .await;

        Ok(map_row_to_contact(&observe("insert_contact", start, row)?))
    }

    /// Apply a partial update. Returns `Ok(None)` if the contact does not exist.
    #[instrument(skip_all, name = "wedding.repo.update_contact", fields(contact_id = %id))]
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        patch: &UpdateContactRequest,
    ) -> Result<Option<ContactRow>, WeddingError> {
        let side = patch.side.as_deref().map(parse_side).transpose()?;

        let start = Instant::now();
        let row = sqlx::query(&format!(
            r#"
            UPDATE contacts SET
                name = COALESCE($2, name),
                side = COALESCE($3, side),
                phone = COALESCE($4, phone),
                email = COALESCE($5, email),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {CONTACT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.name.as_deref().map(str::trim))
        .bind(side.map(|s| s.as_str()))
        .bind(patch.phone.as_deref().map(str::trim))
        .bind(patch.email.as_deref().map(str::trim))
        .fetch_optional(pool)
        .await;

        Ok(observe("update_contact", start, row)?
            .as_ref()
            .map(map_row_to_contact))
    }

    #[instrument(skip_all, name = "wedding.repo.delete_contact", fields(contact_id = %id))]
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, WeddingError> {
        let start = Instant::now();
        let result = sqlx::query("DELETE FROM contacts WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await;

        Ok(observe("delete_contact", start, result)?.rows_affected() > 0)
    }
}

fn parse_side(side: &str) -> Result<Side, WeddingError> {
    Side::parse(side)
        .ok_or_else(|| WeddingError::BadRequest("Side must be 'bride' or 'groom'".to_string()))
}

fn map_row_to_contact(row: &sqlx::postgres::PgRow) -> ContactRow {
    ContactRow {
        id: row.get("id"),
        name: row.get("name"),
        side: row.get("side"),
        phone: row.get("phone"),
        email: row.get("email"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
