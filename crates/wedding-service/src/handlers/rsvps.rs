//! RSVP handlers.
//!
//! - `POST /api/v1/rsvps` - public form submission
//! - `GET /api/v1/admin/rsvps` - all responses with guests, newest first
//! - `GET /api/v1/admin/rsvps/summary` - headcount summary
//! - `PATCH /api/v1/admin/rsvps/{id}` - partial update
//! - `DELETE /api/v1/admin/rsvps/{id}` - delete the RSVP and its guests

use super::{invalid, json_body, path_param};
use crate::errors::WeddingError;
use crate::models::{
    normalize_guest_names, normalize_optional, CreateRsvpRequest, RsvpResponse, RsvpSummary,
    UpdateRsvpRequest,
};
use crate::repositories::rsvps::NewRsvp;
use crate::repositories::RsvpsRepository;
use crate::routes::AppState;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Handler for POST /api/v1/rsvps
///
/// # Response
///
/// - 201 Created: the stored RSVP with its guest names
/// - 400 Bad Request: missing name/email, inconsistent party size
#[instrument(skip_all, name = "wedding.handlers.create_rsvp")]
pub async fn create_rsvp(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateRsvpRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RsvpResponse>), WeddingError> {
    let request = json_body(body)?;
    request.validate().map_err(invalid)?;

    let guest_names = normalize_guest_names(&request.guest_names);
    let phone = normalize_optional(request.phone.as_deref());
    let message = normalize_optional(request.message.as_deref());
    let new = NewRsvp {
        name: request.name.trim(),
        email: request.email.trim(),
        phone: phone.as_deref(),
        attending: request.attending,
        party_size: request.resolved_party_size(),
        message: message.as_deref(),
        guest_names: &guest_names,
    };

    let (row, guests) = RsvpsRepository::create(&state.pool, &new).await?;

    info!(
        target: "wedding.handlers.rsvps",
        rsvp_id = %row.id,
        attending = row.attending,
        party_size = row.party_size,
        "RSVP received"
    );

    Ok((
        StatusCode::CREATED,
        Json(RsvpResponse::from_parts(row, guests)),
    ))
}

/// Handler for GET /api/v1/admin/rsvps
#[instrument(skip_all, name = "wedding.handlers.list_rsvps")]
pub async fn list_rsvps(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RsvpResponse>>, WeddingError> {
    let rsvps = RsvpsRepository::list(&state.pool)
        .await?
        .into_iter()
        .map(|(row, guests)| RsvpResponse::from_parts(row, guests))
        .collect();

    Ok(Json(rsvps))
}

/// Handler for GET /api/v1/admin/rsvps/summary
#[instrument(skip_all, name = "wedding.handlers.rsvp_summary")]
pub async fn rsvp_summary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RsvpSummary>, WeddingError> {
    Ok(Json(RsvpsRepository::summary(&state.pool).await?))
}

/// Handler for PATCH /api/v1/admin/rsvps/{id}
///
/// # Response
///
/// - 200 OK: the updated RSVP
/// - 400 Bad Request: empty patch, invalid field, inconsistent party size
/// - 404 Not Found: no such RSVP
#[instrument(skip_all, name = "wedding.handlers.update_rsvp")]
pub async fn update_rsvp(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateRsvpRequest>, JsonRejection>,
) -> Result<Json<RsvpResponse>, WeddingError> {
    let id = path_param(path)?;
    let patch = json_body(body)?;
    patch.validate().map_err(invalid)?;

    let (row, guests) = RsvpsRepository::update(&state.pool, id, &patch)
        .await?
        .ok_or_else(|| WeddingError::NotFound("RSVP".to_string()))?;

    info!(target: "wedding.handlers.rsvps", rsvp_id = %id, "RSVP updated");

    Ok(Json(RsvpResponse::from_parts(row, guests)))
}

/// Handler for DELETE /api/v1/admin/rsvps/{id}
///
/// # Response
///
/// - 204 No Content: RSVP and guests removed
/// - 404 Not Found: no such RSVP (nothing changed)
#[instrument(skip_all, name = "wedding.handlers.delete_rsvp")]
pub async fn delete_rsvp(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, WeddingError> {
    let id = path_param(path)?;
    let guests_deleted = RsvpsRepository::delete(&state.pool, id).await?;

    info!(
        target: "wedding.handlers.rsvps",
        rsvp_id = %id,
        guests_deleted,
        "RSVP deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}
