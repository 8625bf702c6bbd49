//! HTTP request handlers for the wedding service.
//!
//! Handlers take extractor results rather than the bare extractors so that
//! malformed bodies, paths and queries come back in the service's error
//! shape instead of axum's plain-text rejections.

pub mod admin_session;
pub mod contacts;
pub mod gallery;
pub mod health;
pub mod metrics;
pub mod palette;
pub mod photos;
pub mod qr_codes;
pub mod rsvps;
pub mod witnesses;

pub use health::{health_check, readiness_check};
pub use metrics::metrics_handler;

use crate::errors::WeddingError;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Multipart, Path, Query};
use axum::http::StatusCode;
use axum::Json;

/// Unwrap a JSON body, mapping the rejection to `WeddingError`.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, WeddingError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!(
                target: "wedding.handlers",
                error = %rejection.body_text(),
                "Rejected JSON body"
            );
            Err(match rejection.status() {
                StatusCode::UNSUPPORTED_MEDIA_TYPE => WeddingError::UnsupportedContentType(
                    "Expected Content-Type: application/json".to_string(),
                ),
                _ => WeddingError::BadRequest(rejection.body_text()),
            })
        }
    }
}

/// Unwrap a path parameter.
pub(crate) fn path_param<T>(path: Result<Path<T>, PathRejection>) -> Result<T, WeddingError> {
    path.map(|Path(value)| value)
        .map_err(|rejection| WeddingError::BadRequest(rejection.body_text()))
}

/// Unwrap query parameters.
pub(crate) fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, WeddingError> {
    query
        .map(|Query(value)| value)
        .map_err(|rejection| WeddingError::BadRequest(rejection.body_text()))
}

/// Unwrap a multipart extractor (fails when the request is not
/// `multipart/form-data`).
pub(crate) fn multipart_body(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Multipart, WeddingError> {
    multipart.map_err(|rejection| {
        tracing::debug!(
            target: "wedding.handlers",
            error = %rejection.body_text(),
            "Rejected multipart body"
        );
        WeddingError::BadRequest("Expected a multipart/form-data body".to_string())
    })
}

/// Map a model validation message to a 400.
pub(crate) fn invalid(message: &'static str) -> WeddingError {
    WeddingError::BadRequest(message.to_string())
}
