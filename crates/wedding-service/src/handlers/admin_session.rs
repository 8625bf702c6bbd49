//! Admin session handler.
//!
//! - `POST /api/v1/admin/session` - exchange the admin password for a
//!   bearer token

use super::json_body;
use crate::errors::WeddingError;
use crate::models::{AdminSessionRequest, AdminSessionResponse};
use crate::routes::AppState;
use crate::services::AdminAuthService;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use common::secret::ExposeSecret;
use std::sync::Arc;
use tracing::instrument;

/// Handler for POST /api/v1/admin/session
///
/// # Response
///
/// - 200 OK: `{"accessToken", "tokenType": "Bearer", "expiresIn"}`
/// - 400 Bad Request: malformed body
/// - 401 Unauthorized: wrong password (generic message)
#[instrument(skip_all, name = "wedding.handlers.admin_session")]
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AdminSessionRequest>, JsonRejection>,
) -> Result<Json<AdminSessionResponse>, WeddingError> {
    let request = json_body(body)?;

    let issued = AdminAuthService::login(
        &state.config.admin_password_hash,
        &state.session_keys,
        request.password,
    )
    .await?;

    Ok(Json(AdminSessionResponse {
        access_token: issued.token.expose_secret().to_string(),
        token_type: "Bearer".to_string(),
        expires_in: issued.expires_in,
    }))
}
