//! Gallery handlers.
//!
//! - `GET /api/v1/gallery` - public list ordered by `displayOrder`
//! - `POST /api/v1/admin/gallery` - multipart upload (`file`, `caption`)
//! - `PUT /api/v1/admin/gallery/order` - reorder with the full id list
//! - `PATCH /api/v1/admin/gallery/{id}` - update caption
//! - `DELETE /api/v1/admin/gallery/{id}` - delete metadata, then object

use super::{invalid, json_body, multipart_body, path_param};
use crate::errors::WeddingError;
use crate::models::{GalleryImageRow, ReorderGalleryRequest, UpdateGalleryImageRequest};
use crate::repositories::GalleryRepository;
use crate::routes::AppState;
use crate::services::UploadService;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Handler for GET /api/v1/gallery
#[instrument(skip_all, name = "wedding.handlers.list_gallery")]
pub async fn list_gallery(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<GalleryImageRow>>, WeddingError> {
    Ok(Json(GalleryRepository::list(&state.pool).await?))
}

/// Handler for POST /api/v1/admin/gallery
///
/// # Response
///
/// - 201 Created: the registered image, appended at the end of the gallery
/// - 400 Bad Request: no file part, caption too long
/// - 413 Payload Too Large: file above the gallery limit
/// - 415 Unsupported Media Type: not an allowed image type
/// - 502 Bad Gateway: storage write failed
#[instrument(skip_all, name = "wedding.handlers.upload_gallery_image")]
pub async fn upload_gallery_image(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<GalleryImageRow>), WeddingError> {
    let mut multipart = multipart_body(multipart)?;

    let image = UploadService::upload_gallery_image(
        &state.pool,
        state.store.as_ref(),
        state.config.gallery_max_upload_bytes,
        &mut multipart,
    )
    .await?;

    info!(
        target: "wedding.handlers.gallery",
        image_id = %image.id,
        display_order = image.display_order,
        "Gallery image uploaded"
    );

    Ok((StatusCode::CREATED, Json(image)))
}

/// Handler for PUT /api/v1/admin/gallery/order
///
/// Body: `{"ids": [...]}`, every stored image id exactly once, in the new
/// order. Returns the reordered gallery.
#[instrument(skip_all, name = "wedding.handlers.reorder_gallery")]
pub async fn reorder_gallery(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ReorderGalleryRequest>, JsonRejection>,
) -> Result<Json<Vec<GalleryImageRow>>, WeddingError> {
    let request = json_body(body)?;
    request.validate().map_err(invalid)?;

    let images = GalleryRepository::reorder(&state.pool, &request.ids).await?;
    info!(target: "wedding.handlers.gallery", count = images.len(), "Gallery reordered");

    Ok(Json(images))
}

/// Handler for PATCH /api/v1/admin/gallery/{id}
#[instrument(skip_all, name = "wedding.handlers.update_gallery_image")]
pub async fn update_gallery_image(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateGalleryImageRequest>, JsonRejection>,
) -> Result<Json<GalleryImageRow>, WeddingError> {
    let id = path_param(path)?;
    let request = json_body(body)?;
    request.validate().map_err(invalid)?;

    GalleryRepository::update_caption(&state.pool, id, request.caption.trim())
        .await?
        .map(Json)
        .ok_or_else(|| WeddingError::NotFound("Gallery image".to_string()))
}

/// Handler for DELETE /api/v1/admin/gallery/{id}
#[instrument(skip_all, name = "wedding.handlers.delete_gallery_image")]
pub async fn delete_gallery_image(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, WeddingError> {
    let id = path_param(path)?;
    UploadService::delete_gallery_image(&state.pool, state.store.as_ref(), id).await?;

    info!(target: "wedding.handlers.gallery", image_id = %id, "Gallery image deleted");
    Ok(StatusCode::NO_CONTENT)
}
