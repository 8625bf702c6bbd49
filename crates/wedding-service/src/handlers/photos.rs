//! Table photo handlers.
//!
//! - `POST /api/v1/photos/upload` - guest upload (`file`, `tableNumber`,
//!   `uploadedBy`)
//! - `GET /api/v1/tables/{table_number}/photos` - one table, newest first
//! - `GET /api/v1/admin/photos` - every table, optional `?table=` filter
//! - `DELETE /api/v1/admin/photos/{id}` - delete metadata, then object
//!
//! The per-table listing is public: anyone holding a table's QR link can
//! see that table's photos.

use super::{multipart_body, path_param, query_params};
use crate::errors::WeddingError;
use crate::models::{PhotoListQuery, TablePhotoResponse};
use crate::repositories::TablePhotosRepository;
use crate::routes::AppState;
use crate::services::uploads::parse_table_number;
use crate::services::UploadService;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Handler for POST /api/v1/photos/upload
///
/// # Response
///
/// - 201 Created: the registered photo
/// - 400 Bad Request: no file part, missing or out-of-range table number
/// - 413 Payload Too Large: file above the photo limit
/// - 415 Unsupported Media Type: not an allowed image type
/// - 502 Bad Gateway: storage write failed
#[instrument(skip_all, name = "wedding.handlers.upload_table_photo")]
pub async fn upload_table_photo(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<TablePhotoResponse>), WeddingError> {
    let mut multipart = multipart_body(multipart)?;

    let photo = UploadService::upload_table_photo(
        &state.pool,
        state.store.as_ref(),
        state.config.photo_max_upload_bytes,
        state.config.max_table_number,
        &mut multipart,
    )
    .await?;

    info!(
        target: "wedding.handlers.photos",
        photo_id = %photo.id,
        table_number = photo.table_number,
        "Table photo uploaded"
    );

    Ok((StatusCode::CREATED, Json(photo.into())))
}

/// Handler for GET /api/v1/tables/{table_number}/photos
#[instrument(skip_all, name = "wedding.handlers.list_table_photos")]
pub async fn list_table_photos(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Vec<TablePhotoResponse>>, WeddingError> {
    let raw = path_param(path)?;
    let table_number = parse_table_number(Some(&raw), state.config.max_table_number)?;

    let photos = TablePhotosRepository::list_for_table(&state.pool, table_number).await?;
    Ok(Json(photos.into_iter().map(Into::into).collect()))
}

/// Handler for GET /api/v1/admin/photos
#[instrument(skip_all, name = "wedding.handlers.list_all_photos")]
pub async fn list_all_photos(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PhotoListQuery>, QueryRejection>,
) -> Result<Json<Vec<TablePhotoResponse>>, WeddingError> {
    let query = query_params(query)?;

    let photos = TablePhotosRepository::list(&state.pool, query.table).await?;
    Ok(Json(photos.into_iter().map(Into::into).collect()))
}

/// Handler for DELETE /api/v1/admin/photos/{id}
#[instrument(skip_all, name = "wedding.handlers.delete_table_photo")]
pub async fn delete_table_photo(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, WeddingError> {
    let id = path_param(path)?;
    UploadService::delete_table_photo(&state.pool, state.store.as_ref(), id).await?;

    info!(target: "wedding.handlers.photos", photo_id = %id, "Table photo deleted");
    Ok(StatusCode::NO_CONTENT)
}
