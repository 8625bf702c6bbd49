//! Contact handlers.
//!
//! - `GET /api/v1/contacts` - public list, grouped by side
//! - `POST /api/v1/admin/contacts` - create
//! - `PATCH /api/v1/admin/contacts/{id}` - partial update
//! - `DELETE /api/v1/admin/contacts/{id}` - delete

use super::{invalid, json_body, path_param};
use crate::errors::WeddingError;
use crate::models::{ContactRow, CreateContactRequest, UpdateContactRequest};
use crate::repositories::ContactsRepository;
use crate::routes::AppState;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

#[instrument(skip_all, name = "wedding.handlers.list_contacts")]
pub async fn list_contacts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ContactRow>>, WeddingError> {
    Ok(Json(ContactsRepository::list(&state.pool).await?))
}

#[instrument(skip_all, name = "wedding.handlers.create_contact")]
pub async fn create_contact(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateContactRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ContactRow>), WeddingError> {
    let request = json_body(body)?;
    request.validate().map_err(invalid)?;

    let contact = ContactsRepository::create(&state.pool, &request).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

#[instrument(skip_all, name = "wedding.handlers.update_contact")]
pub async fn update_contact(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateContactRequest>, JsonRejection>,
) -> Result<Json<ContactRow>, WeddingError> {
    let id = path_param(path)?;
    let patch = json_body(body)?;
    patch.validate().map_err(invalid)?;

    ContactsRepository::update(&state.pool, id, &patch)
        .await?
        .map(Json)
        .ok_or_else(|| WeddingError::NotFound("Contact".to_string()))
}

#[instrument(skip_all, name = "wedding.handlers.delete_contact")]
pub async fn delete_contact(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, WeddingError> {
    let id = path_param(path)?;
    if ContactsRepository::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(WeddingError::NotFound("Contact".to_string()))
    }
}
