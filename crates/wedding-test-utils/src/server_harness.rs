//! Test server harness for E2E testing
//!
//! Provides `TestWeddingServer` for spawning real wedding service instances
//! in tests. Uploads go to a `MockBlobStore` the test can inspect.

use common::jwt::SessionKeys;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sqlx::PgPool;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use wedding_service::config::Config;
use wedding_service::observability::metrics::init_metrics_recorder;
use wedding_service::routes::{self, AppState};
use wedding_service::services::storage::MockBlobStore;

/// Admin password accepted by every test server.
pub const TEST_ADMIN_PASSWORD: &str = "test-admin-password";

/// Session signing secret used by every test server.
pub const TEST_SESSION_SECRET: &str = "test-session-secret-that-is-at-least-32-bytes";

/// Public base URL used in QR payloads.
pub const TEST_PUBLIC_BASE_URL: &str = "https://wedding.test";

static TEST_METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
static TEST_PASSWORD_HASH: OnceLock<String> = OnceLock::new();

fn test_metrics_handle() -> PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            init_metrics_recorder()
                .unwrap_or_else(|_| PrometheusBuilder::new().build_recorder().handle())
        })
        .clone()
}

/// bcrypt hash of [`TEST_ADMIN_PASSWORD`] at minimum cost, computed once.
pub fn test_password_hash() -> String {
    TEST_PASSWORD_HASH
        .get_or_init(|| {
            bcrypt::hash(TEST_ADMIN_PASSWORD, 4).expect("bcrypt hashing should succeed")
        })
        .clone()
}

/// Environment for a test server; `overrides` replace or add variables.
pub fn test_vars(overrides: &[(&str, &str)]) -> HashMap<String, String> {
    let mut vars = HashMap::from([
        (
            "DATABASE_URL".to_string(),
            "postgresql://test/test".to_string(),
        ),
        ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
        ("ADMIN_PASSWORD_HASH".to_string(), test_password_hash()),
        (
            "ADMIN_SESSION_SECRET".to_string(),
            TEST_SESSION_SECRET.to_string(),
        ),
        (
            "PUBLIC_BASE_URL".to_string(),
            TEST_PUBLIC_BASE_URL.to_string(),
        ),
        ("SHUTDOWN_DRAIN_SECONDS".to_string(), "0".to_string()),
    ]);
    for (key, value) in overrides {
        vars.insert((*key).to_string(), (*value).to_string());
    }
    vars
}

/// Test harness for spawning the wedding service in E2E tests.
pub struct TestWeddingServer {
    addr: SocketAddr,
    pool: PgPool,
    config: Config,
    store: Arc<MockBlobStore>,
    client: reqwest::Client,
    _handle: JoinHandle<()>,
}

impl TestWeddingServer {
    /// Spawn a server with the default test configuration.
    pub async fn spawn(pool: PgPool) -> Result<Self, anyhow::Error> {
        Self::spawn_with(pool, &[]).await
    }

    /// Spawn a server with configuration overrides, e.g.
    /// `[("PHOTO_MAX_UPLOAD_BYTES", "1024")]`.
    ///
    /// The server binds to 127.0.0.1:0 and stores uploads in a fresh
    /// `MockBlobStore`.
    pub async fn spawn_with(
        pool: PgPool,
        overrides: &[(&str, &str)],
    ) -> Result<Self, anyhow::Error> {
        let config = Config::from_vars(&test_vars(overrides))
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let store = Arc::new(MockBlobStore::new());
        let session_keys = SessionKeys::from_secret(
            &config.admin_session_secret,
            Duration::from_secs(config.admin_session_ttl_seconds),
        );

        let state = Arc::new(AppState {
            pool: pool.clone(),
            config: config.clone(),
            store: store.clone(),
            session_keys,
        });

        let app = routes::build_routes(state, test_metrics_handle());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            pool,
            config,
            store,
            client: reqwest::Client::new(),
            _handle: handle,
        })
    }

    /// Get reference to the database pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The in-memory blob store behind the server.
    pub fn store(&self) -> &MockBlobStore {
        &self.store
    }

    /// Shared HTTP client.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Log in with [`TEST_ADMIN_PASSWORD`] and return the bearer token.
    pub async fn admin_token(&self) -> Result<String, anyhow::Error> {
        let response = self
            .client
            .post(format!("{}/api/v1/admin/session", self.url()))
            .json(&serde_json::json!({ "password": TEST_ADMIN_PASSWORD }))
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("Admin login failed with status {}", response.status());
        }

        let body: serde_json::Value = response.json().await?;
        body["accessToken"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("Login response has no accessToken"))
    }
}

impl Drop for TestWeddingServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
