//! Health check handlers.
//!
//! - `/health`: Liveness probe - returns OK if the process is running
//! - `/ready`: Readiness probe - checks the database and the blob store

use crate::models::ReadinessResponse;
use crate::routes::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

/// Liveness probe handler. Does not check dependencies.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness probe handler.
///
/// Returns 200 if the database answers and the storage backend is usable,
/// 503 otherwise. Error messages are generic; the cause is logged.
#[tracing::instrument(skip_all, name = "wedding.health.readiness")]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if let Err(e) = sqlx::query("SELECT 1").fetch_one(&state.pool).await {
        tracing::warn!(target: "wedding.handlers.health", error = %e, "Readiness check failed: database");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                status: "not_ready",
                database: Some("unhealthy"),
                storage: None,
                error: Some("Service dependencies unavailable".to_string()),
            }),
        );
    }

    if let Err(e) = state.store.health_check().await {
        tracing::warn!(
            target: "wedding.handlers.health",
            backend = state.store.backend(),
            error = %e,
            "Readiness check failed: storage"
        );
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                status: "not_ready",
                database: Some("healthy"),
                storage: Some("unavailable"),
                error: Some("Service dependencies unavailable".to_string()),
            }),
        );
    }

    (
        StatusCode::OK,
        Json(ReadinessResponse {
            status: "ready",
            database: Some("healthy"),
            storage: Some("available"),
            error: None,
        }),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        assert_eq!(health_check().await, "OK");
    }

    #[test]
    fn test_readiness_response_omits_empty_fields() {
        let ready = ReadinessResponse {
            status: "ready",
            database: Some("healthy"),
            storage: Some("available"),
            error: None,
        };
        let json = serde_json::to_string(&ready).unwrap();
        assert!(json.contains("\"storage\":\"available\""));
        assert!(!json.contains("\"error\""));

        let not_ready = ReadinessResponse {
            status: "not_ready",
            database: Some("unhealthy"),
            storage: None,
            error: Some("Service dependencies unavailable".to_string()),
        };
        let json = serde_json::to_string(&not_ready).unwrap();
        assert!(json.contains("\"status\":\"not_ready\""));
        assert!(!json.contains("\"storage\""));
    }
}
