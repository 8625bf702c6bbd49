//! RSVP repository.
//!
//! An RSVP and its guest rows are always written together inside one
//! transaction: create inserts both, update may replace the guest list,
//! and delete removes the guests before the parent. `rsvp_guests` uses
//! `ON DELETE RESTRICT`, so a parent can never be removed while guests
//! still reference it.

use super::{clearable, observe};
use crate::errors::WeddingError;
use crate::models::{
    derived_party_size, normalize_guest_names, validate_party, GuestRow, RsvpRow, RsvpSummary,
    UpdateRsvpRequest,
};
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::collections::HashMap;
use std::time::Instant;
use tracing::instrument;
use uuid::Uuid;

const RSVP_COLUMNS: &str =
    "id, name, email, phone, attending, party_size, message, created_at, updated_at";

/// Validated values for a new RSVP.
#[derive(Debug, Clone)]
pub struct NewRsvp<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub attending: bool,
    pub party_size: i32,
    pub message: Option<&'a str>,
    pub guest_names: &'a [String],
}

/// An RSVP with its guests ordered by position.
pub type RsvpWithGuests = (RsvpRow, Vec<GuestRow>);

/// RSVP repository for database operations.
pub struct RsvpsRepository;

impl RsvpsRepository {
    /// Insert an RSVP and its guests atomically.
    #[instrument(skip_all, name = "wedding.repo.create_rsvp")]
    pub async fn create(pool: &PgPool, new: &NewRsvp<'_>) -> Result<RsvpWithGuests, WeddingError> {
        let start = Instant::now();
        let mut tx = observe("begin_create_rsvp", start, pool.begin().await)?;

        let start = Instant::now();
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO rsvps (name, email, phone, attending, party_size, message)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {RSVP_COLUMNS}
            "#
        ))
        .bind(new.name) // $1
        .bind(new.email) // $2
        .bind(new.phone) // $3
        .bind(new.attending) // $4
        .bind(new.party_size) // $5
        .bind(new.message) // $6
        .fetch_one(&mut *tx)
        .await;
        let rsvp = map_row_to_rsvp(&observe("insert_rsvp", start, row)?);

        let guests = insert_guests(&mut tx, rsvp.id, new.guest_names).await?;

        let start = Instant::now();
        observe("commit_create_rsvp", start, tx.commit().await)?;

        tracing::info!(
            target: "wedding.repo.rsvps",
            rsvp_id = %rsvp.id,
            attending = rsvp.attending,
            guests = guests.len(),
            "RSVP recorded"
        );

        Ok((rsvp, guests))
    }

    /// List all RSVPs, newest first, each with its guests.
    #[instrument(skip_all, name = "wedding.repo.list_rsvps")]
    pub async fn list(pool: &PgPool) -> Result<Vec<RsvpWithGuests>, WeddingError> {
        let start = Instant::now();
        let rows = sqlx::query(&format!(
            "SELECT {RSVP_COLUMNS} FROM rsvps ORDER BY created_at DESC, id"
        ))
        .fetch_all(pool)
        .await;
        let rsvps: Vec<RsvpRow> = observe("list_rsvps", start, rows)?
            .iter()
            .map(map_row_to_rsvp)
            .collect();

        let ids: Vec<Uuid> = rsvps.iter().map(|r| r.id).collect();

        let start = Instant::now();
        let rows = sqlx::query(
            r#"
            SELECT id, rsvp_id, name, position, created_at
            FROM rsvp_guests
            WHERE rsvp_id = ANY($1)
            ORDER BY rsvp_id, position
            "#,
        )
        .bind(&ids)
        .fetch_all(pool)
        .await;

        let mut guests_by_rsvp: HashMap<Uuid, Vec<GuestRow>> = HashMap::new();
        for guest in observe("list_rsvp_guests", start, rows)?
            .iter()
            .map(map_row_to_guest)
        {
            guests_by_rsvp.entry(guest.rsvp_id).or_default().push(guest);
        }

        Ok(rsvps
            .into_iter()
            .map(|rsvp| {
                let guests = guests_by_rsvp.remove(&rsvp.id).unwrap_or_default();
                (rsvp, guests)
            })
            .collect())
    }

    /// Apply a partial update inside one transaction.
    ///
    /// The parent row is locked, the patch merged, and party size checked
    /// against the merged attendance and guest count. When `guestNames` is
    /// present the guest list is replaced (delete all, then insert).
    ///
    /// Returns `Ok(None)` if the RSVP does not exist.
    #[instrument(skip_all, name = "wedding.repo.update_rsvp", fields(rsvp_id = %id))]
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        patch: &UpdateRsvpRequest,
    ) -> Result<Option<RsvpWithGuests>, WeddingError> {
        let start = Instant::now();
        let mut tx = observe("begin_update_rsvp", start, pool.begin().await)?;

        let start = Instant::now();
        let row = sqlx::query(&format!(
            "SELECT {RSVP_COLUMNS} FROM rsvps WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await;
        let Some(row) = observe("lock_rsvp", start, row)? else {
            return Ok(None);
        };
        let current = map_row_to_rsvp(&row);

        let new_guests = patch.guest_names.as_deref().map(normalize_guest_names);

        let guest_count = match &new_guests {
            Some(names) => names.len(),
            None => {
                let start = Instant::now();
                let count: Result<i64, sqlx::Error> =
                    sqlx::query_scalar("SELECT COUNT(*) FROM rsvp_guests WHERE rsvp_id = $1")
                        .bind(id)
                        .fetch_one(&mut *tx)
                        .await;
                usize::try_from(observe("count_rsvp_guests", start, count)?).unwrap_or(0)
            }
        };

        let attending = patch.attending.unwrap_or(current.attending);
        let party_size = match patch.party_size {
            Some(size) => size,
            None if patch.attending.is_some() || new_guests.is_some() => {
                derived_party_size(attending, guest_count)
            }
            None => current.party_size,
        };

        validate_party(attending, party_size, guest_count)
            .map_err(|msg| WeddingError::BadRequest(msg.to_string()))?;

        let phone = clearable(patch.phone.as_deref());
        let message = clearable(patch.message.as_deref());

        let start = Instant::now();
        let row = sqlx::query(&format!(
            r#"
            UPDATE rsvps SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = CASE WHEN $4 THEN $5 ELSE phone END,
                attending = $6,
                party_size = $7,
                message = CASE WHEN $8 THEN $9 ELSE message END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {RSVP_COLUMNS}
            "#
        ))
        .bind(id) // $1
        .bind(patch.name.as_deref().map(str::trim)) // $2
        .bind(patch.email.as_deref().map(str::trim)) // $3
        .bind(phone.is_some()) // $4
        .bind(phone.flatten()) // $5
        .bind(attending) // $6
        .bind(party_size) // $7
        .bind(message.is_some()) // $8
        .bind(message.flatten()) // $9
        .fetch_one(&mut *tx)
        .await;
        let rsvp = map_row_to_rsvp(&observe("update_rsvp", start, row)?);

        let guests = match new_guests {
            Some(names) => {
                let start = Instant::now();
                let deleted = sqlx::query("DELETE FROM rsvp_guests WHERE rsvp_id = $1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await;
                observe("delete_rsvp_guests", start, deleted)?;

                insert_guests(&mut tx, id, &names).await?
            }
            None => {
                let start = Instant::now();
                let rows = sqlx::query(
                    r#"
                    SELECT id, rsvp_id, name, position, created_at
                    FROM rsvp_guests
                    WHERE rsvp_id = $1
                    ORDER BY position
                    "#,
                )
                .bind(id)
                .fetch_all(&mut *tx)
                .await;
                observe("get_rsvp_guests", start, rows)?
                    .iter()
                    .map(map_row_to_guest)
                    .collect()
            }
        };

        let start = Instant::now();
        observe("commit_update_rsvp", start, tx.commit().await)?;

        Ok(Some((rsvp, guests)))
    }

    /// Delete an RSVP and all of its guests in one transaction.
    ///
    /// Returns the number of guest rows removed, or `NotFound` (with the
    /// transaction rolled back) if the RSVP does not exist.
    #[instrument(skip_all, name = "wedding.repo.delete_rsvp", fields(rsvp_id = %id))]
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, WeddingError> {
        let start = Instant::now();
        let mut tx = observe("begin_delete_rsvp", start, pool.begin().await)?;

        let start = Instant::now();
        let guests = sqlx::query("DELETE FROM rsvp_guests WHERE rsvp_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await;
        let guests_deleted = observe("delete_rsvp_guests", start, guests)?.rows_affected();

        let start = Instant::now();
        let parent = sqlx::query("DELETE FROM rsvps WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await;
        if observe("delete_rsvp", start, parent)?.rows_affected() == 0 {
            let start = Instant::now();
            observe("rollback_delete_rsvp", start, tx.rollback().await)?;
            return Err(WeddingError::NotFound("RSVP".to_string()));
        }

        let start = Instant::now();
        observe("commit_delete_rsvp", start, tx.commit().await)?;

        tracing::info!(
            target: "wedding.repo.rsvps",
            rsvp_id = %id,
            guests_deleted,
            "RSVP deleted"
        );

        Ok(guests_deleted)
    }

    /// Attendance totals.
    #[instrument(skip_all, name = "wedding.repo.rsvp_summary")]
    pub async fn summary(pool: &PgPool) -> Result<RsvpSummary, WeddingError> {
        let start = Instant::now();
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total_responses,
                COUNT(*) FILTER (WHERE attending) AS attending,
                COUNT(*) FILTER (WHERE NOT attending) AS not_attending,
                COALESCE(SUM(party_size) FILTER (WHERE attending), 0)::BIGINT AS total_guests
            FROM rsvps
            "#,
        )
        .fetch_one(pool)
        .await;
        let row = observe("rsvp_summary", start, row)?;

        Ok(RsvpSummary {
            total_responses: row.get("total_responses"),
            attending: row.get("attending"),
            not_attending: row.get("not_attending"),
            total_guests: row.get("total_guests"),
        })
    }
}

/// Insert guest rows in order, positions starting at 0.
async fn insert_guests(
    tx: &mut Transaction<'_, Postgres>,
    rsvp_id: Uuid,
    names: &[String],
) -> Result<Vec<GuestRow>, WeddingError> {
    if names.is_empty() {
        return Ok(Vec::new());
    }

    let positions: Vec<i32> = (0..names.len())
        .map(|i| i32::try_from(i).unwrap_or(i32::MAX))
        .collect();

    let start = Instant::now();
    let rows = sqlx::query(
        r#"
        INSERT INTO rsvp_guests (rsvp_id, name, position)
        SELECT $1, guest.name, guest.position
        FROM UNNEST($2::text[], $3::int[]) AS guest(name, position)
        RETURNING id, rsvp_id, name, position, created_at
        "#,
    )
    .bind(rsvp_id) // $1
    .bind(names) // $2
    .bind(&positions) // $3
    .fetch_all(&mut **tx)
    .await;

    let mut guests: Vec<GuestRow> = observe("insert_rsvp_guests", start, rows)?
        .iter()
        .map(map_row_to_guest)
        .collect();
    guests.sort_by_key(|g| g.position);
    Ok(guests)
}

fn map_row_to_rsvp(row: &sqlx::postgres::PgRow) -> RsvpRow {
    RsvpRow {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        attending: row.get("attending"),
        party_size: row.get("party_size"),
        message: row.get("message"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn map_row_to_guest(row: &sqlx::postgres::PgRow) -> GuestRow {
    GuestRow {
        id: row.get("id"),
        rsvp_id: row.get("rsvp_id"),
        name: row.get("name"),
        position: row.get("position"),
        created_at: row.get("created_at"),
    }
}
