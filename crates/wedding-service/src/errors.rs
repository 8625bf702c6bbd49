//! Wedding service error types.
//!
//! All errors map to HTTP status codes via the `IntoResponse` impl.
//! Messages returned to clients are generic for database, storage and
//! internal failures; the real cause is logged server-side.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Wedding service error type.
///
/// Maps to HTTP status codes:
/// - Database, Internal: 500 Internal Server Error
/// - Storage: 502 Bad Gateway
/// - NotFound: 404 Not Found
/// - BadRequest, MissingFile: 400 Bad Request
/// - UnsupportedMediaType, UnsupportedContentType: 415 Unsupported Media Type
/// - PayloadTooLarge: 413 Payload Too Large
/// - InvalidCredentials, InvalidToken: 401 Unauthorized
#[derive(Debug, Error)]
pub enum WeddingError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("No file was provided")]
    MissingFile,

    /// Uploaded file outside the image allow list.
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Request body sent with the wrong `Content-Type`; the message is
    /// returned as is.
    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("Payload too large: limit is {limit_bytes} bytes")]
    PayloadTooLarge { limit_bytes: usize },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Internal server error")]
    Internal,
}

impl WeddingError {
    /// Returns the HTTP status code for this error (for metrics recording).
    pub fn status_code(&self) -> u16 {
        match self {
            WeddingError::Database(_) | WeddingError::Internal => 500,
            WeddingError::Storage(_) => 502,
            WeddingError::NotFound(_) => 404,
            WeddingError::BadRequest(_) | WeddingError::MissingFile => 400,
            WeddingError::UnsupportedMediaType(_) | WeddingError::UnsupportedContentType(_) => {
                415
            }
            WeddingError::PayloadTooLarge { .. } => 413,
            WeddingError::InvalidCredentials | WeddingError::InvalidToken(_) => 401,
        }
    }

    /// Stable machine-readable code, also used as a metrics label.
    pub fn code(&self) -> &'static str {
        match self {
            WeddingError::Database(_) => "DATABASE_ERROR",
            WeddingError::Storage(_) => "STORAGE_ERROR",
            WeddingError::NotFound(_) => "NOT_FOUND",
            WeddingError::BadRequest(_) => "BAD_REQUEST",
            WeddingError::MissingFile => "MISSING_FILE",
            WeddingError::UnsupportedMediaType(_) | WeddingError::UnsupportedContentType(_) => {
                "UNSUPPORTED_MEDIA_TYPE"
            }
            WeddingError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            WeddingError::InvalidCredentials => "INVALID_CREDENTIALS",
            WeddingError::InvalidToken(_) => "INVALID_TOKEN",
            WeddingError::Internal => "INTERNAL_ERROR",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for WeddingError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = match &self {
            WeddingError::Database(err) => {
                // Log actual error server-side, return generic message to client
                tracing::error!(target: "wedding.database", error = %err, "Database operation failed");
                "An internal database error occurred".to_string()
            }
            WeddingError::Storage(err) => {
                tracing::error!(target: "wedding.storage", error = %err, "Storage operation failed");
                "The file could not be stored. Please try again later.".to_string()
            }
            WeddingError::NotFound(resource) => format!("{} not found", resource),
            WeddingError::BadRequest(reason) => reason.clone(),
            WeddingError::MissingFile => "No file was provided".to_string(),
            WeddingError::UnsupportedMediaType(content_type) => format!(
                "Unsupported file type '{}'. Allowed types: JPEG, PNG, WebP, GIF",
                content_type
            ),
            WeddingError::UnsupportedContentType(reason) => reason.clone(),
            WeddingError::PayloadTooLarge { limit_bytes } => format!(
                "File is too large. Maximum size is {} MB",
                limit_bytes.div_ceil(1024 * 1024)
            ),
            WeddingError::InvalidCredentials => "Invalid password".to_string(),
            WeddingError::InvalidToken(reason) => reason.clone(),
            WeddingError::Internal => "An internal error occurred".to_string(),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: self.code().to_string(),
                message,
            },
        };

        let mut response = (status, Json(error_response)).into_response();

        // Add WWW-Authenticate header for 401 responses
        if status == StatusCode::UNAUTHORIZED {
            let challenge = match self {
                WeddingError::InvalidToken(_) => {
                    "Bearer realm=\"wedding-admin\", error=\"invalid_token\""
                }
                _ => "Bearer realm=\"wedding-admin\"",
            };
            if let Ok(header_value) = challenge.parse() {
                response
                    .headers_mut()
                    .insert("WWW-Authenticate", header_value);
            }
        }

        response
    }
}

/// Convert sqlx errors to WeddingError
impl From<sqlx::Error> for WeddingError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => WeddingError::NotFound("Record".to_string()),
            other => WeddingError::Database(other.to_string()),
        }
    }
}
