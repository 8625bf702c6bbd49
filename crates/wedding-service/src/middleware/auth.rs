//! Admin authentication middleware.
//!
//! Extracts the Bearer token from the Authorization header, verifies it
//! with the session keys and stores the claims in request extensions.

use crate::errors::WeddingError;
use crate::observability::metrics;
use crate::routes::AppState;
use crate::services::AdminAuthService;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::IntoResponse,
};
use common::jwt::AdminClaims;
use std::sync::Arc;
use tracing::instrument;

/// Extract Bearer token from the Authorization header.
fn extract_bearer_token(req: &Request) -> Result<&str, WeddingError> {
    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::debug!(target: "wedding.middleware.auth", "Missing Authorization header");
            metrics::record_admin_token_rejection("missing");
            WeddingError::InvalidToken("Missing Authorization header".to_string())
        })?;

    auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        tracing::debug!(target: "wedding.middleware.auth", "Invalid Authorization header format");
        metrics::record_admin_token_rejection("malformed_header");
        WeddingError::InvalidToken("Invalid Authorization header format".to_string())
    })
}

/// Authentication middleware for admin routes.
///
/// # Response
///
/// - Returns 401 Unauthorized if the token is missing, malformed, expired
///   or signed with another secret
/// - Continues to next handler with `AdminClaims` in extensions otherwise
#[instrument(skip_all, name = "wedding.middleware.require_admin")]
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, WeddingError> {
    let token = extract_bearer_token(&req)?;
    let claims: AdminClaims = AdminAuthService::verify(&state.session_keys, token)?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
