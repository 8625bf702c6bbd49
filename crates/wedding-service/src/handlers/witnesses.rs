//! Witness handlers.
//!
//! - `GET /api/v1/witnesses` - public list
//! - `POST /api/v1/admin/witnesses` - create
//! - `PATCH /api/v1/admin/witnesses/{id}` - partial update
//! - `DELETE /api/v1/admin/witnesses/{id}` - delete

use super::{invalid, json_body, path_param};
use crate::errors::WeddingError;
use crate::models::{CreateWitnessRequest, UpdateWitnessRequest, WitnessRow};
use crate::repositories::WitnessesRepository;
use crate::routes::AppState;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Handler for GET /api/v1/witnesses
#[instrument(skip_all, name = "wedding.handlers.list_witnesses")]
pub async fn list_witnesses(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<WitnessRow>>, WeddingError> {
    Ok(Json(WitnessesRepository::list(&state.pool).await?))
}

/// Handler for POST /api/v1/admin/witnesses
#[instrument(skip_all, name = "wedding.handlers.create_witness")]
pub async fn create_witness(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateWitnessRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<WitnessRow>), WeddingError> {
    let request = json_body(body)?;
    request.validate().map_err(invalid)?;

    let witness = WitnessesRepository::create(&state.pool, &request).await?;
    info!(target: "wedding.handlers.witnesses", witness_id = %witness.id, "Witness created");

    Ok((StatusCode::CREATED, Json(witness)))
}

/// Handler for PATCH /api/v1/admin/witnesses/{id}
#[instrument(skip_all, name = "wedding.handlers.update_witness")]
pub async fn update_witness(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateWitnessRequest>, JsonRejection>,
) -> Result<Json<WitnessRow>, WeddingError> {
    let id = path_param(path)?;
    let patch = json_body(body)?;
    patch.validate().map_err(invalid)?;

    let witness = WitnessesRepository::update(&state.pool, id, &patch)
        .await?
        .ok_or_else(|| WeddingError::NotFound("Witness".to_string()))?;

    Ok(Json(witness))
}

/// Handler for DELETE /api/v1/admin/witnesses/{id}
#[instrument(skip_all, name = "wedding.handlers.delete_witness")]
pub async fn delete_witness(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, WeddingError> {
    let id = path_param(path)?;
    if !WitnessesRepository::delete(&state.pool, id).await? {
        return Err(WeddingError::NotFound("Witness".to_string()));
    }

    info!(target: "wedding.handlers.witnesses", witness_id = %id, "Witness deleted");
    Ok(StatusCode::NO_CONTENT)
}
