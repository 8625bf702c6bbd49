//! Palette handlers.
//!
//! - `GET /api/v1/palette` - public list
//! - `POST /api/v1/admin/palette` - add a color (hex validated)
//! - `PATCH /api/v1/admin/palette/{id}` - rename or recolor
//! - `DELETE /api/v1/admin/palette/{id}` - remove

use super::{invalid, json_body, path_param};
use crate::errors::WeddingError;
use crate::models::{CreatePaletteColorRequest, PaletteColorRow, UpdatePaletteColorRequest};
use crate::repositories::PaletteRepository;
use crate::routes::AppState;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Handler for GET /api/v1/palette
#[instrument(skip_all, name = "wedding.handlers.list_palette")]
pub async fn list_palette(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PaletteColorRow>>, WeddingError> {
    Ok(Json(PaletteRepository::list(&state.pool).await?))
}

/// Handler for POST /api/v1/admin/palette
///
/// # Response
///
/// - 201 Created: the stored color with its derived `styleToken`
/// - 400 Bad Request: blank name or value not `#RRGGBB` / `#RGB`
#[instrument(skip_all, name = "wedding.handlers.create_palette_color")]
pub async fn create_palette_color(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreatePaletteColorRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PaletteColorRow>), WeddingError> {
    let request = json_body(body)?;
    request.validate().map_err(invalid)?;

    let color = PaletteRepository::create(&state.pool, &request).await?;
    info!(
        target: "wedding.handlers.palette",
        color_id = %color.id,
        value = %color.value,
        "Palette color added"
    );

    Ok((StatusCode::CREATED, Json(color)))
}

/// Handler for PATCH /api/v1/admin/palette/{id}
#[instrument(skip_all, name = "wedding.handlers.update_palette_color")]
pub async fn update_palette_color(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdatePaletteColorRequest>, JsonRejection>,
) -> Result<Json<PaletteColorRow>, WeddingError> {
    let id = path_param(path)?;
    let patch = json_body(body)?;
    patch.validate().map_err(invalid)?;

    PaletteRepository::update(&state.pool, id, &patch)
        .await?
        .map(Json)
        .ok_or_else(|| WeddingError::NotFound("Palette color".to_string()))
}

/// Handler for DELETE /api/v1/admin/palette/{id}
#[instrument(skip_all, name = "wedding.handlers.delete_palette_color")]
pub async fn delete_palette_color(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, WeddingError> {
    let id = path_param(path)?;
    if !PaletteRepository::delete(&state.pool, id).await? {
        return Err(WeddingError::NotFound("Palette color".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
