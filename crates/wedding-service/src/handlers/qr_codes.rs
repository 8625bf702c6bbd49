//! QR code handlers (admin).
//!
//! - `GET /api/v1/admin/qr-codes?tables=N` - JSON list for tables `1..=N`
//! - `GET /api/v1/admin/qr-codes/{table_number}` - one code as SVG

use super::{path_param, query_params};
use crate::errors::WeddingError;
use crate::models::{QrCodeResponse, QrCodesQuery};
use crate::routes::AppState;
use crate::services::qr::{self, DEFAULT_QR_TABLE_COUNT};
use crate::services::uploads::parse_table_number;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;
use tracing::instrument;

/// Handler for GET /api/v1/admin/qr-codes
///
/// `tables` defaults to 10 and must be within `1..=MAX_TABLE_NUMBER`.
#[instrument(skip_all, name = "wedding.handlers.list_qr_codes")]
pub async fn list_qr_codes(
    State(state): State<Arc<AppState>>,
    query: Result<Query<QrCodesQuery>, QueryRejection>,
) -> Result<Json<Vec<QrCodeResponse>>, WeddingError> {
    let query = query_params(query)?;
    let max = state.config.max_table_number;
    let count = query.tables.unwrap_or_else(|| DEFAULT_QR_TABLE_COUNT.min(max));

    if !(1..=max).contains(&count) {
        return Err(WeddingError::BadRequest(format!(
            "Table count must be between 1 and {max}"
        )));
    }

    Ok(Json(qr::table_qr_codes(&state.config.public_base_url, count)?))
}

/// Handler for GET /api/v1/admin/qr-codes/{table_number}
#[instrument(skip_all, name = "wedding.handlers.table_qr_code")]
pub async fn table_qr_code(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, WeddingError> {
    let raw = path_param(path)?;
    let table_number = parse_table_number(Some(&raw), state.config.max_table_number)?;

    let code = qr::table_qr_code(&state.config.public_base_url, table_number)?;

    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], code.svg))
}
