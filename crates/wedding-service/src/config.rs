//! Wedding service configuration.
//!
//! Configuration is loaded from environment variables. Secrets (admin
//! password hash, session signing secret) and the database URL are
//! redacted in Debug output.

use common::jwt::MIN_SESSION_SECRET_BYTES;
use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default database pool size.
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Default admin session lifetime (8 hours).
pub const DEFAULT_ADMIN_SESSION_TTL_SECONDS: u64 = 8 * 60 * 60;

/// Shortest allowed admin session lifetime.
pub const MIN_ADMIN_SESSION_TTL_SECONDS: u64 = 60;

/// Longest allowed admin session lifetime (7 days).
pub const MAX_ADMIN_SESSION_TTL_SECONDS: u64 = 7 * 24 * 60 * 60;

/// Default base URL encoded in table QR codes.
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:8080";

/// Default root directory for the local storage backend.
pub const DEFAULT_LOCAL_STORAGE_DIR: &str = "./uploads";

/// Default URL prefix under which local objects are served.
pub const DEFAULT_LOCAL_STORAGE_PUBLIC_PREFIX: &str = "/uploads";

/// First path segments owned by the router; the local storage prefix may
/// not start with any of them.
pub const RESERVED_ROUTE_SEGMENTS: &[&str] = &["api", "health", "ready", "metrics"];

/// Default gallery upload limit (5 MiB).
pub const DEFAULT_GALLERY_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Default table photo upload limit (10 MiB).
pub const DEFAULT_PHOTO_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Default highest table number accepted for photo uploads.
pub const DEFAULT_MAX_TABLE_NUMBER: i32 = 50;

/// Upper bound on `MAX_TABLE_NUMBER`.
pub const MAX_TABLE_NUMBER_LIMIT: i32 = 500;

/// Default graceful shutdown drain period.
pub const DEFAULT_SHUTDOWN_DRAIN_SECONDS: u64 = 5;

/// Where uploaded binaries live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    /// Files on local disk, served back by this service.
    Local {
        /// Root directory for stored objects.
        root: PathBuf,
        /// URL path prefix for public object URLs (e.g. "/uploads").
        public_prefix: String,
    },

    /// S3-compatible bucket. Credentials and region come from the
    /// standard AWS environment.
    S3 {
        /// Bucket name.
        bucket: String,
        /// Public URL base for objects (CDN or bucket website).
        public_url: String,
        /// Custom endpoint for S3-compatible stores (MinIO, R2).
        endpoint_url: Option<String>,
    },
}

impl StorageConfig {
    /// Backend name for logs and readiness output.
    pub fn backend_name(&self) -> &'static str {
        match self {
            StorageConfig::Local { .. } => "local",
            StorageConfig::S3 { .. } => "s3",
        }
    }
}

/// Wedding service configuration.
#[derive(Clone)]
pub struct Config {
    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum database pool connections.
    pub db_max_connections: u32,

    /// bcrypt hash of the admin password.
    pub admin_password_hash: SecretString,

    /// HMAC secret used to sign admin session tokens.
    pub admin_session_secret: SecretString,

    /// Admin session lifetime in seconds.
    pub admin_session_ttl_seconds: u64,

    /// Base URL of the public site, encoded in table QR codes.
    pub public_base_url: String,

    /// Storage backend for uploaded files.
    pub storage: StorageConfig,

    /// Maximum gallery image size in bytes.
    pub gallery_max_upload_bytes: usize,

    /// Maximum table photo size in bytes.
    pub photo_max_upload_bytes: usize,

    /// Highest accepted table number (tables are numbered from 1).
    pub max_table_number: i32,

    /// Seconds to keep draining connections after a shutdown signal.
    pub shutdown_drain_seconds: u64,
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("bind_address", &self.bind_address)
            .field("db_max_connections", &self.db_max_connections)
            .field("admin_password_hash", &"[REDACTED]")
            .field("admin_session_secret", &"[REDACTED]")
            .field("admin_session_ttl_seconds", &self.admin_session_ttl_seconds)
            .field("public_base_url", &self.public_base_url)
            .field("storage", &self.storage)
            .field("gallery_max_upload_bytes", &self.gallery_max_upload_bytes)
            .field("photo_max_upload_bytes", &self.photo_max_upload_bytes)
            .field("max_table_number", &self.max_table_number)
            .field("shutdown_drain_seconds", &self.shutdown_drain_seconds)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid admin credentials configuration: {0}")]
    InvalidAdminCredentials(String),

    #[error("Invalid storage configuration: {0}")]
    InvalidStorage(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = required(vars, "DATABASE_URL")?;

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let db_max_connections =
            parse_bounded(vars, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS, 1, 200)?;

        let admin_password_hash = required(vars, "ADMIN_PASSWORD_HASH")?;
        // bcrypt modular crypt format: $2a$/$2b$/$2y$ prefix, 60 chars total
        if !admin_password_hash.starts_with("$2") || admin_password_hash.len() != 60 {
            return Err(ConfigError::InvalidAdminCredentials(
                "ADMIN_PASSWORD_HASH must be a bcrypt hash".to_string(),
            ));
        }

        let admin_session_secret = required(vars, "ADMIN_SESSION_SECRET")?;
        if admin_session_secret.len() < MIN_SESSION_SECRET_BYTES {
            return Err(ConfigError::InvalidAdminCredentials(format!(
                "ADMIN_SESSION_SECRET must be at least {} bytes",
                MIN_SESSION_SECRET_BYTES
            )));
        }

        let admin_session_ttl_seconds = parse_bounded(
            vars,
            "ADMIN_SESSION_TTL_SECONDS",
            DEFAULT_ADMIN_SESSION_TTL_SECONDS,
            MIN_ADMIN_SESSION_TTL_SECONDS,
            MAX_ADMIN_SESSION_TTL_SECONDS,
        )?;

        let public_base_url = vars
            .get("PUBLIC_BASE_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_PUBLIC_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        if !public_base_url.starts_with("http://") && !public_base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(format!(
                "PUBLIC_BASE_URL must start with http:// or https://, got '{}'",
                public_base_url
            )));
        }

        let storage = parse_storage(vars)?;

        let gallery_max_upload_bytes = parse_bounded(
            vars,
            "GALLERY_MAX_UPLOAD_BYTES",
            DEFAULT_GALLERY_MAX_UPLOAD_BYTES,
            1,
            usize::MAX,
        )?;

        let photo_max_upload_bytes = parse_bounded(
            vars,
            "PHOTO_MAX_UPLOAD_BYTES",
            DEFAULT_PHOTO_MAX_UPLOAD_BYTES,
            1,
            usize::MAX,
        )?;

        let max_table_number = parse_bounded(
            vars,
            "MAX_TABLE_NUMBER",
            DEFAULT_MAX_TABLE_NUMBER,
            1,
            MAX_TABLE_NUMBER_LIMIT,
        )?;

        let shutdown_drain_seconds = parse_bounded(
            vars,
            "SHUTDOWN_DRAIN_SECONDS",
            DEFAULT_SHUTDOWN_DRAIN_SECONDS,
            0,
            300,
        )?;

        Ok(Config {
            database_url,
            bind_address,
            db_max_connections,
            admin_password_hash: SecretString::from(admin_password_hash),
            admin_session_secret: SecretString::from(admin_session_secret),
            admin_session_ttl_seconds,
            public_base_url,
            storage,
            gallery_max_upload_bytes,
            photo_max_upload_bytes,
            max_table_number,
            shutdown_drain_seconds,
        })
    }

    /// Largest request body any route has to accept.
    ///
    /// Leaves headroom over the biggest upload limit for multipart framing
    /// and the other form fields, so oversized files are caught by the
    /// per-field check and reported with the feature's own limit.
    pub fn request_body_limit(&self) -> usize {
        self.gallery_max_upload_bytes
            .max(self.photo_max_upload_bytes)
            .saturating_add(1024 * 1024)
    }
}

fn required(vars: &HashMap<String, String>, key: &str) -> Result<String, ConfigError> {
    vars.get(key)
        .filter(|v| !v.is_empty())
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

fn parse_bounded<T>(
    vars: &HashMap<String, String>,
    key: &str,
    default: T,
    min: T,
    max: T,
) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + fmt::Display + Copy,
    T::Err: fmt::Display,
{
    let Some(value_str) = vars.get(key) else {
        return Ok(default);
    };

    let value: T = value_str.parse().map_err(|e| {
        ConfigError::InvalidValue(format!(
            "{} must be a valid integer, got '{}': {}",
            key, value_str, e
        ))
    })?;

    if value < min || value > max {
        return Err(ConfigError::InvalidValue(format!(
            "{} must be between {} and {}, got {}",
            key, min, max, value
        )));
    }

    Ok(value)
}

fn parse_storage(vars: &HashMap<String, String>) -> Result<StorageConfig, ConfigError> {
    let backend = vars
        .get("STORAGE_BACKEND")
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_else(|| "local".to_string());

    match backend.as_str() {
        "local" => {
            let root = vars
                .get("LOCAL_STORAGE_DIR")
                .cloned()
                .unwrap_or_else(|| DEFAULT_LOCAL_STORAGE_DIR.to_string());

            let public_prefix = vars
                .get("LOCAL_STORAGE_PUBLIC_PREFIX")
                .cloned()
                .unwrap_or_else(|| DEFAULT_LOCAL_STORAGE_PUBLIC_PREFIX.to_string());
            let public_prefix = format!("/{}", public_prefix.trim_matches('/'));
            let first_segment = public_prefix
                .trim_start_matches('/')
                .split('/')
                .next()
                .unwrap_or_default();
            if first_segment.is_empty()
                || RESERVED_ROUTE_SEGMENTS.contains(&first_segment)
                || public_prefix.contains([':', '*', '{', '}'])
            {
                return Err(ConfigError::InvalidStorage(format!(
                    "LOCAL_STORAGE_PUBLIC_PREFIX must be a dedicated path, got '{}'",
                    public_prefix
                )));
            }

            Ok(StorageConfig::Local {
                root: PathBuf::from(root),
                public_prefix,
            })
        }
        "s3" => {
            let bucket = required(vars, "S3_BUCKET")?;
            let public_url = required(vars, "S3_PUBLIC_URL")?
                .trim_end_matches('/')
                .to_string();
            let endpoint_url = vars.get("S3_ENDPOINT_URL").filter(|v| !v.is_empty()).cloned();

            Ok(StorageConfig::S3 {
                bucket,
                public_url,
                endpoint_url,
            })
        }
        other => Err(ConfigError::InvalidStorage(format!(
            "STORAGE_BACKEND must be 'local' or 's3', got '{}'",
            other
        ))),
    }
}
