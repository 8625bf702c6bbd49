//! Wedding Site Service
//!
//! Entry point for the wedding website backend.
//!
//! # Startup Flow
//!
//! 1. Initialize tracing (`LOG_FORMAT=json` for JSON output)
//! 2. Load configuration from environment
//! 3. Initialize Prometheus metrics recorder
//! 4. Connect to PostgreSQL and apply migrations
//! 5. Build the configured blob store
//! 6. Serve HTTP until SIGINT/SIGTERM, then drain

use common::jwt::SessionKeys;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wedding_service::config::Config;
use wedding_service::observability::metrics::init_metrics_recorder;
use wedding_service::routes::{self, AppState};
use wedding_service::services::storage::build_store;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting wedding service");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        public_base_url = %config.public_base_url,
        storage_backend = config.storage.backend_name(),
        max_table_number = config.max_table_number,
        "Configuration loaded successfully"
    );

    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics recorder: {}", e);
        e
    })?;

    // Initialize database connection pool with query timeout
    info!("Connecting to database...");
    let db_url_with_timeout = add_query_timeout(&config.database_url, 5);
    let db_pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&db_url_with_timeout)
        .await
        .map_err(|e| {
            error!("Failed to connect to database: {}", e);
            e
        })?;

    sqlx::migrate!("../../migrations")
        .run(&db_pool)
        .await
        .map_err(|e| {
            error!("Failed to apply migrations: {}", e);
            e
        })?;

    info!("Database connection established");

    let store = build_store(&config.storage).await.map_err(|e| {
        error!("Failed to initialize blob store: {}", e);
        e
    })?;

    info!(backend = store.backend(), "Blob store ready");

    let session_keys = SessionKeys::from_secret(
        &config.admin_session_secret,
        Duration::from_secs(config.admin_session_ttl_seconds),
    );

    let bind_address = config.bind_address.clone();
    let drain_seconds = config.shutdown_drain_seconds;

    let state = Arc::new(AppState {
        pool: db_pool,
        config,
        store,
        session_keys,
    });

    let app = routes::build_routes(state, metrics_handle);

    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("Wedding service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(drain_seconds))
    .await?;

    info!("Wedding service shutdown complete");

    Ok(())
}

/// Initialize the tracing subscriber.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "wedding_service=debug,tower_http=debug".into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Listens for shutdown signals (SIGTERM, SIGINT).
/// Returns when a shutdown signal is received and drain period is complete.
async fn shutdown_signal(drain_secs: u64) {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    if drain_secs > 0 {
        warn!("Draining connections for {} seconds...", drain_secs);
        tokio::time::sleep(Duration::from_secs(drain_secs)).await;
        info!("Drain period complete");
    } else {
        info!("Skipping drain period (SHUTDOWN_DRAIN_SECONDS=0)");
    }
}

/// Adds statement_timeout to the database URL.
fn add_query_timeout(url: &str, timeout_secs: u32) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!(
        "{}{}options=-c%20statement_timeout%3D{}s",
        url, separator, timeout_secs
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_query_timeout() {
        assert_eq!(
            add_query_timeout("postgres://localhost/wedding", 5),
            "postgres://localhost/wedding?options=-c%20statement_timeout%3D5s"
        );
        assert_eq!(
            add_query_timeout("postgres://localhost/wedding?sslmode=disable", 5),
            "postgres://localhost/wedding?sslmode=disable&options=-c%20statement_timeout%3D5s"
        );
    }
}
