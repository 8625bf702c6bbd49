//! Upload-and-register.
//!
//! Both gallery images and table photos follow the same sequence:
//!
//! 1. Read the multipart form, streaming the `file` part and aborting as
//!    soon as it exceeds the feature limit
//! 2. Check the declared MIME type against the image allow-list
//! 3. Write the bytes to the blob store under a fresh key
//! 4. Insert the metadata row; if that fails, delete the stored object
//!
//! Deleting reverses the order: the row goes first, then the object. An
//! object left behind after a failed storage delete is logged, the caller
//! still gets success.

use crate::errors::WeddingError;
use crate::models::{
    validate_caption, GalleryImageRow, TablePhotoRow, DEFAULT_UPLOADED_BY, MAX_UPLOADED_BY_LENGTH,
};
use crate::observability::metrics;
use crate::repositories::photos::NewTablePhoto;
use crate::repositories::{GalleryRepository, TablePhotosRepository};
use crate::services::storage::{delete_object, put_object, BlobStore};
use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;
use bytes::{Bytes, BytesMut};
use sqlx::PgPool;
use std::collections::HashMap;
use std::future::Future;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::instrument;
use uuid::Uuid;

/// Declared MIME types accepted for uploads.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/webp",
    "image/gif",
];

/// Name of the multipart part carrying the file.
pub const FILE_FIELD: &str = "file";

/// Cap on each non-file form field.
pub const MAX_TEXT_FIELD_BYTES: usize = 8 * 1024;

/// Which collection an upload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFeature {
    Gallery,
    TablePhoto,
}

impl UploadFeature {
    /// Metrics label.
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadFeature::Gallery => "gallery",
            UploadFeature::TablePhoto => "table_photo",
        }
    }

    /// Storage key prefix.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            UploadFeature::Gallery => "gallery",
            UploadFeature::TablePhoto => "photos",
        }
    }
}

/// The file part of an upload form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub bytes: Bytes,
    pub content_type: String,
    pub original_filename: Option<String>,
}

/// A parsed upload form.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<UploadedFile>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    /// A text field, trimmed; blank values count as absent.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// The file part, or `MissingFile` if it is absent or empty.
    pub fn take_file(&mut self) -> Result<UploadedFile, WeddingError> {
        match self.file.take() {
            Some(file) if !file.bytes.is_empty() => Ok(file),
            _ => Err(WeddingError::MissingFile),
        }
    }
}

/// An object written to the blob store, not yet registered.
#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub key: String,
    pub url: String,
    pub size: usize,
    pub content_type: String,
    pub original_filename: Option<String>,
}

/// Check a declared MIME type against [`ALLOWED_IMAGE_TYPES`].
pub fn validate_content_type(content_type: Option<&str>) -> Result<String, WeddingError> {
    let declared = content_type
        .map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        })
        .unwrap_or_default();

    if ALLOWED_IMAGE_TYPES.contains(&declared.as_str()) {
        Ok(declared)
    } else if declared.is_empty() {
        Err(WeddingError::UnsupportedMediaType(
            "application/octet-stream".to_string(),
        ))
    } else {
        Err(WeddingError::UnsupportedMediaType(declared))
    }
}

/// File extension for a stored object.
///
/// Derived from the MIME type; falls back to the original filename's
/// extension (ASCII alphanumeric, at most 8 chars), then `bin`.
pub fn extension_for(content_type: &str, original_filename: Option<&str>) -> String {
    let from_type = match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    };
    if let Some(ext) = from_type {
        return ext.to_string();
    }

    original_filename
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .unwrap_or_else(|| "bin".to_string())
}

/// Unique storage key: `<prefix>/<unix-millis>-<uuid>.<ext>`.
pub fn generate_key(prefix: &str, content_type: &str, original_filename: Option<&str>) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);

    format!(
        "{}/{}-{}.{}",
        prefix,
        millis,
        Uuid::new_v4().simple(),
        extension_for(content_type, original_filename)
    )
}

fn map_multipart_error(err: MultipartError, limit_bytes: usize) -> WeddingError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        WeddingError::PayloadTooLarge { limit_bytes }
    } else {
        WeddingError::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
    }
}

/// Read a multipart upload form.
///
/// The `file` part is checked for an allowed content type before any of it
/// is read, then streamed chunk by chunk; reading stops with
/// `PayloadTooLarge` once it exceeds `max_file_bytes`. Other parts are read
/// as UTF-8 text up to [`MAX_TEXT_FIELD_BYTES`].
pub async fn read_upload_form(
    multipart: &mut Multipart,
    max_file_bytes: usize,
) -> Result<UploadForm, WeddingError> {
    let mut form = UploadForm::default();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| map_multipart_error(e, max_file_bytes))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == FILE_FIELD {
            if form.file.is_some() {
                return Err(WeddingError::BadRequest(
                    "Only one file may be uploaded per request".to_string(),
                ));
            }

            let content_type = validate_content_type(field.content_type())?;
            let original_filename = field
                .file_name()
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty());

            let mut buf = BytesMut::new();
            while let Some(chunk) = field
                .chunk()
                .await
                .map_err(|e| map_multipart_error(e, max_file_bytes))?
            {
                if buf.len().saturating_add(chunk.len()) > max_file_bytes {
                    return Err(WeddingError::PayloadTooLarge {
                        limit_bytes: max_file_bytes,
                    });
                }
                buf.extend_from_slice(&chunk);
            }

            form.file = Some(UploadedFile {
                bytes: buf.freeze(),
                content_type,
                original_filename,
            });
        } else {
            let mut buf = BytesMut::new();
            while let Some(chunk) = field
                .chunk()
                .await
                .map_err(|e| map_multipart_error(e, max_file_bytes))?
            {
                if buf.len().saturating_add(chunk.len()) > MAX_TEXT_FIELD_BYTES {
                    return Err(WeddingError::BadRequest(format!(
                        "Form field '{name}' is too long"
                    )));
                }
                buf.extend_from_slice(&chunk);
            }

            let value = String::from_utf8(buf.to_vec()).map_err(|_| {
                WeddingError::BadRequest(format!("Form field '{name}' must be UTF-8 text"))
            })?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

/// Parse and range-check a table number.
pub fn parse_table_number(value: Option<&str>, max_table_number: i32) -> Result<i32, WeddingError> {
    let value = value.ok_or_else(|| WeddingError::BadRequest("Table number is required".to_string()))?;

    match value.trim().parse::<i32>() {
        Ok(n) if (1..=max_table_number).contains(&n) => Ok(n),
        _ => Err(WeddingError::BadRequest(format!(
            "Table number must be between 1 and {max_table_number}"
        ))),
    }
}

/// Upload-and-register service.
pub struct UploadService;

impl UploadService {
    /// Store a file, then run `register` with the stored object.
    ///
    /// If `register` fails, the object is deleted again before the error is
    /// returned. A failed compensation is logged at error level with the
    /// orphaned key.
    pub async fn store_and_register<T, F, Fut>(
        store: &dyn BlobStore,
        feature: UploadFeature,
        file: UploadedFile,
        register: F,
    ) -> Result<T, WeddingError>
    where
        F: FnOnce(StoredUpload) -> Fut,
        Fut: Future<Output = Result<T, WeddingError>>,
    {
        let start = Instant::now();
        let size = file.bytes.len();
        let key = generate_key(
            feature.key_prefix(),
            &file.content_type,
            file.original_filename.as_deref(),
        );

        let url = match put_object(store, &key, file.bytes, &file.content_type).await {
            Ok(url) => url,
            Err(e) => {
                let e = match e {
                    WeddingError::Storage(msg) => WeddingError::Storage(msg),
                    other => WeddingError::Storage(other.to_string()),
                };
                metrics::record_upload(feature.as_str(), e.code(), size, start.elapsed());
                return Err(e);
            }
        };

        let stored = StoredUpload {
            key: key.clone(),
            url,
            size,
            content_type: file.content_type,
            original_filename: file.original_filename,
        };

        match register(stored).await {
            Ok(record) => {
                metrics::record_upload(feature.as_str(), "success", size, start.elapsed());
                tracing::info!(
                    target: "wedding.services.uploads",
                    feature = feature.as_str(),
                    key = %key,
                    size,
                    "Upload registered"
                );
                Ok(record)
            }
            Err(e) => {
                match delete_object(store, &key).await {
                    Ok(()) => {
                        metrics::record_upload_compensation(feature.as_str(), "success");
                        tracing::warn!(
                            target: "wedding.services.uploads",
                            feature = feature.as_str(),
                            key = %key,
                            error = %e,
                            "Metadata insert failed, stored object removed"
                        );
                    }
                    Err(delete_err) => {
                        metrics::record_upload_compensation(feature.as_str(), "error");
                        tracing::error!(
                            target: "wedding.services.uploads",
                            feature = feature.as_str(),
                            orphaned_key = %key,
                            error = %e,
                            delete_error = %delete_err,
                            "Metadata insert failed and stored object could not be removed"
                        );
                    }
                }
                metrics::record_upload(feature.as_str(), e.code(), size, start.elapsed());
                Err(e)
            }
        }
    }

    /// Handle an admin gallery upload (`file`, optional `caption`).
    #[instrument(skip_all, name = "wedding.services.upload_gallery_image")]
    pub async fn upload_gallery_image(
        pool: &PgPool,
        store: &dyn BlobStore,
        max_bytes: usize,
        multipart: &mut Multipart,
    ) -> Result<GalleryImageRow, WeddingError> {
        let feature = UploadFeature::Gallery;
        let start = Instant::now();
        let mut form = Self::read_form(feature, start, multipart, max_bytes).await?;
        let parsed = form.take_file().and_then(|file| {
            let caption = form.field("caption").unwrap_or_default().to_string();
            validate_caption(&caption).map_err(|msg| WeddingError::BadRequest(msg.to_string()))?;
            Ok((file, caption))
        });
        let (file, caption) = Self::reject_on_error(feature, start, parsed)?;

        Self::store_and_register(store, feature, file, |stored| async move {
            GalleryRepository::insert(pool, &stored.key, &caption, &stored.url).await
        })
        .await
    }

    /// Handle a guest table-photo upload (`file`, `tableNumber`, optional
    /// `uploadedBy`).
    #[instrument(skip_all, name = "wedding.services.upload_table_photo")]
    pub async fn upload_table_photo(
        pool: &PgPool,
        store: &dyn BlobStore,
        max_bytes: usize,
        max_table_number: i32,
        multipart: &mut Multipart,
    ) -> Result<TablePhotoRow, WeddingError> {
        let feature = UploadFeature::TablePhoto;
        let start = Instant::now();
        let mut form = Self::read_form(feature, start, multipart, max_bytes).await?;
        let parsed = form.take_file().and_then(|file| {
            let table_number = parse_table_number(form.field("tableNumber"), max_table_number)?;
            let uploaded_by = form
                .field("uploadedBy")
                .unwrap_or(DEFAULT_UPLOADED_BY)
                .to_string();
            if uploaded_by.chars().count() > MAX_UPLOADED_BY_LENGTH {
                return Err(WeddingError::BadRequest(
                    "Uploader name must be at most 100 characters".to_string(),
                ));
            }
            Ok((file, table_number, uploaded_by))
        });
        let (file, table_number, uploaded_by) = Self::reject_on_error(feature, start, parsed)?;

        Self::store_and_register(store, feature, file, |stored| async move {
            let new = NewTablePhoto {
                table_number,
                image_url: &stored.url,
                storage_key: &stored.key,
                uploaded_by: &uploaded_by,
                original_filename: stored.original_filename.as_deref(),
                file_size: i64::try_from(stored.size).unwrap_or(i64::MAX),
                file_type: &stored.content_type,
            };
            TablePhotosRepository::insert(pool, &new).await
        })
        .await
    }

    /// Delete a gallery image row, then its object.
    #[instrument(skip_all, name = "wedding.services.delete_gallery_image", fields(image_id = %id))]
    pub async fn delete_gallery_image(
        pool: &PgPool,
        store: &dyn BlobStore,
        id: Uuid,
    ) -> Result<(), WeddingError> {
        let row = GalleryRepository::delete(pool, id)
            .await?
            .ok_or_else(|| WeddingError::NotFound("Gallery image".to_string()))?;

        Self::remove_object(store, UploadFeature::Gallery, &row.filename).await;
        Ok(())
    }

    /// Delete a table photo row, then its object.
    #[instrument(skip_all, name = "wedding.services.delete_table_photo", fields(photo_id = %id))]
    pub async fn delete_table_photo(
        pool: &PgPool,
        store: &dyn BlobStore,
        id: Uuid,
    ) -> Result<(), WeddingError> {
        let row = TablePhotosRepository::delete(pool, id)
            .await?
            .ok_or_else(|| WeddingError::NotFound("Photo".to_string()))?;

        Self::remove_object(store, UploadFeature::TablePhoto, &row.storage_key).await;
        Ok(())
    }

    async fn read_form(
        feature: UploadFeature,
        start: Instant,
        multipart: &mut Multipart,
        max_bytes: usize,
    ) -> Result<UploadForm, WeddingError> {
        read_upload_form(multipart, max_bytes).await.map_err(|e| {
            metrics::record_upload(feature.as_str(), e.code(), 0, start.elapsed());
            tracing::debug!(
                target: "wedding.services.uploads",
                feature = feature.as_str(),
                error = %e,
                "Upload rejected"
            );
            e
        })
    }

    fn reject_on_error<T>(
        feature: UploadFeature,
        start: Instant,
        result: Result<T, WeddingError>,
    ) -> Result<T, WeddingError> {
        result.map_err(|e| {
            metrics::record_upload(feature.as_str(), e.code(), 0, start.elapsed());
            e
        })
    }

    /// The row is already gone; a failure here only orphans the object.
    async fn remove_object(store: &dyn BlobStore, feature: UploadFeature, key: &str) {
        if let Err(e) = delete_object(store, key).await {
            tracing::warn!(
                target: "wedding.services.uploads",
                feature = feature.as_str(),
                orphaned_key = %key,
                error = %e,
                "Record deleted but stored object could not be removed"
            );
        }
    }
}
