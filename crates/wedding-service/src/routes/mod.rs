//! HTTP routes for the wedding service.
//!
//! Defines the Axum router and application state.

use crate::config::{Config, StorageConfig};
use crate::handlers::{
    self, admin_session, contacts, gallery, palette, photos, qr_codes, rsvps, witnesses,
};
use crate::middleware::{http_metrics_middleware, require_admin};
use crate::services::BlobStore;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use common::jwt::SessionKeys;
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: PgPool,

    /// Service configuration.
    pub config: Config,

    /// Blob store for uploaded images.
    pub store: Arc<dyn BlobStore>,

    /// Admin session signing keys.
    pub session_keys: SessionKeys,
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/health`, `/ready`, `/metrics` - operational, public, unversioned
/// - `/api/v1/...` - public site endpoints (RSVP form, gallery, palette,
///   witnesses, contacts, table photos, admin login)
/// - `/api/v1/admin/...` - admin endpoints behind `require_admin`
/// - the local storage prefix served from disk when the local backend is
///   configured
/// - request body limit sized for the largest upload
/// - TraceLayer for request logging
/// - HTTP metrics middleware
/// - 30 second request timeout
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let body_limit = state.config.request_body_limit();

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/api/v1/rsvps", post(rsvps::create_rsvp))
        .route("/api/v1/gallery", get(gallery::list_gallery))
        .route("/api/v1/palette", get(palette::list_palette))
        .route("/api/v1/witnesses", get(witnesses::list_witnesses))
        .route("/api/v1/contacts", get(contacts::list_contacts))
        .route("/api/v1/photos/upload", post(photos::upload_table_photo))
        .route(
            "/api/v1/tables/:table_number/photos",
            get(photos::list_table_photos),
        )
        .route("/api/v1/admin/session", post(admin_session::create_session))
        .with_state(state.clone());

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Admin routes (session token required)
    let admin_routes = Router::new()
        .route("/api/v1/admin/rsvps", get(rsvps::list_rsvps))
        .route("/api/v1/admin/rsvps/summary", get(rsvps::rsvp_summary))
        .route(
            "/api/v1/admin/rsvps/:id",
            patch(rsvps::update_rsvp).delete(rsvps::delete_rsvp),
        )
        .route("/api/v1/admin/witnesses", post(witnesses::create_witness))
        .route(
            "/api/v1/admin/witnesses/:id",
            patch(witnesses::update_witness).delete(witnesses::delete_witness),
        )
        .route("/api/v1/admin/contacts", post(contacts::create_contact))
        .route(
            "/api/v1/admin/contacts/:id",
            patch(contacts::update_contact).delete(contacts::delete_contact),
        )
        .route("/api/v1/admin/palette", post(palette::create_palette_color))
        .route(
            "/api/v1/admin/palette/:id",
            patch(palette::update_palette_color).delete(palette::delete_palette_color),
        )
        .route("/api/v1/admin/gallery", post(gallery::upload_gallery_image))
        .route("/api/v1/admin/gallery/order", put(gallery::reorder_gallery))
        .route(
            "/api/v1/admin/gallery/:id",
            patch(gallery::update_gallery_image).delete(gallery::delete_gallery_image),
        )
        .route("/api/v1/admin/photos", get(photos::list_all_photos))
        .route(
            "/api/v1/admin/photos/:id",
            axum::routing::delete(photos::delete_table_photo),
        )
        .route("/api/v1/admin/qr-codes", get(qr_codes::list_qr_codes))
        .route(
            "/api/v1/admin/qr-codes/:table_number",
            get(qr_codes::table_qr_code),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .with_state(state.clone());

    let mut app = public_routes.merge(metrics_routes).merge(admin_routes);

    if let StorageConfig::Local {
        root,
        public_prefix,
    } = &state.config.storage
    {
        app = app.nest_service(public_prefix, ServeDir::new(root));
    }

    // Layer order (bottom-to-top execution):
    // 1. DefaultBodyLimit - caps request bodies (innermost)
    // 2. TraceLayer - Log request details
    // 3. TimeoutLayer - Timeout the request
    // 4. http_metrics_middleware - Record ALL responses (outermost)
    app.layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(middleware::from_fn(http_metrics_middleware))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::services::storage::MockBlobStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use common::secret::SecretString;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::collections::HashMap;
    use tower::ServiceExt;

    fn state_with_prefix(prefix: &str) -> Arc<AppState> {
        let vars = HashMap::from([
            (
                "DATABASE_URL".to_string(),
                "postgresql://localhost/wedding_test".to_string(),
            ),
            (
                "ADMIN_PASSWORD_HASH".to_string(),
                "$2b$04$9v0eM9ZQn1XcYkQhEJ1gNeqC2vXwQ0W1QOq3mGmM4QxJx8uXQk3dW".to_string(),
            ),
            (
                "ADMIN_SESSION_SECRET".to_string(),
                "an-adequately-long-session-secret-value".to_string(),
            ),
            (
                "LOCAL_STORAGE_PUBLIC_PREFIX".to_string(),
                prefix.to_string(),
            ),
        ]);
        let config = Config::from_vars(&vars).unwrap();
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        let session_keys = SessionKeys::from_secret(
            &SecretString::from("an-adequately-long-session-secret-value"),
            Duration::from_secs(60),
        );

        Arc::new(AppState {
            pool,
            config,
            store: Arc::new(MockBlobStore::new()),
            session_keys,
        })
    }

    #[tokio::test]
    async fn test_local_prefix_mounts_beside_routes() {
        for prefix in ["/uploads", "/media/files", "/apis"] {
            let handle = PrometheusBuilder::new().build_recorder().handle();
            let app = build_routes(state_with_prefix(prefix), handle);

            let response = app
                .oneshot(Request::get("/health").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{prefix}");
        }
    }

    #[test]
    fn test_app_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }
}
