//! Metrics definitions for the wedding service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `wedding_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `method`: HTTP verbs
//! - `endpoint`: parameterized route templates, anything else is `/other`
//! - `status`: success, error, timeout
//! - `feature`: gallery, table_photo
//! - `outcome`: success or an error code
//! - `operation`: bounded by code (insert_rsvp, put, delete, ...)

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("wedding_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.200, 0.500, 1.000, 2.000, 5.000, 10.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("wedding_db_query".to_string()),
            &[
                0.001, 0.002, 0.005, 0.010, 0.020, 0.050, 0.100, 0.250, 0.500, 1.000,
            ],
        )
        .map_err(|e| format!("Failed to set DB query buckets: {e}"))?
        // Uploads include the client transfer, so the tail is long
        .set_buckets_for_metric(
            Matcher::Prefix("wedding_upload".to_string()),
            &[0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000, 30.000],
        )
        .map_err(|e| format!("Failed to set upload buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("wedding_storage_operation".to_string()),
            &[0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500],
        )
        .map_err(|e| format!("Failed to set storage buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `wedding_http_requests_total`, `wedding_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
///
/// Captures framework-level rejections (404, 405, 413 from the body limit)
/// as well as handler responses.
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("wedding_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint.clone(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("wedding_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Fixed API paths without dynamic segments.
const STATIC_ENDPOINTS: &[&str] = &[
    "/",
    "/health",
    "/ready",
    "/metrics",
    "/api/v1/rsvps",
    "/api/v1/gallery",
    "/api/v1/palette",
    "/api/v1/witnesses",
    "/api/v1/contacts",
    "/api/v1/photos/upload",
    "/api/v1/admin/session",
    "/api/v1/admin/rsvps",
    "/api/v1/admin/rsvps/summary",
    "/api/v1/admin/witnesses",
    "/api/v1/admin/contacts",
    "/api/v1/admin/palette",
    "/api/v1/admin/gallery",
    "/api/v1/admin/gallery/order",
    "/api/v1/admin/photos",
    "/api/v1/admin/qr-codes",
];

/// Admin collections addressed as `/api/v1/admin/{resource}/{id}`.
const ADMIN_ID_RESOURCES: &[&str] = &[
    "rsvps",
    "witnesses",
    "contacts",
    "palette",
    "gallery",
    "photos",
];

/// Normalize endpoint path to prevent label cardinality explosion
fn normalize_endpoint(path: &str) -> String {
    if STATIC_ENDPOINTS.contains(&path) {
        return path.to_string();
    }
    normalize_dynamic_endpoint(path)
}

/// Replace ids and table numbers with placeholders.
fn normalize_dynamic_endpoint(path: &str) -> String {
    let parts: Vec<&str> = path.split('/').collect();

    match parts.as_slice() {
        ["", "api", "v1", "tables", _, "photos"] => {
            "/api/v1/tables/{table_number}/photos".to_string()
        }
        ["", "api", "v1", "admin", "qr-codes", _] => {
            "/api/v1/admin/qr-codes/{table_number}".to_string()
        }
        ["", "api", "v1", "admin", resource, _] if ADMIN_ID_RESOURCES.contains(resource) => {
            format!("/api/v1/admin/{resource}/{{id}}")
        }
        // Unknown paths (including stored objects) normalized to "/other"
        _ => "/other".to_string(),
    }
}

// ============================================================================
// Database Metrics
// ============================================================================

/// Record database query execution
///
/// Metric: `wedding_db_query_duration_seconds`, `wedding_db_queries_total`
/// Labels: `operation`, `status`
pub fn record_db_query(operation: &str, status: &str, duration: Duration) {
    histogram!("wedding_db_query_duration_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("wedding_db_queries_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

// ============================================================================
// Upload Metrics
// ============================================================================

/// Record the outcome of an upload-and-register operation.
///
/// Metric: `wedding_uploads_total`, `wedding_upload_duration_seconds`,
/// `wedding_upload_bytes_total` (successful uploads only)
/// Labels: `feature`, `outcome`
pub fn record_upload(feature: &str, outcome: &str, bytes: usize, duration: Duration) {
    histogram!("wedding_upload_duration_seconds",
        "feature" => feature.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("wedding_uploads_total",
        "feature" => feature.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    if outcome == "success" {
        counter!("wedding_upload_bytes_total",
            "feature" => feature.to_string()
        )
        .increment(u64::try_from(bytes).unwrap_or(u64::MAX));
    }
}

/// Record removal of an object whose metadata insert failed.
///
/// Metric: `wedding_upload_compensations_total`
/// Labels: `feature`, `status`
pub fn record_upload_compensation(feature: &str, status: &str) {
    counter!("wedding_upload_compensations_total",
        "feature" => feature.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

// ============================================================================
// Storage Metrics
// ============================================================================

/// Record a blob store call.
///
/// Metric: `wedding_storage_operation_duration_seconds`, `wedding_storage_operations_total`
/// Labels: `backend`, `operation`, `status`
pub fn record_storage_operation(backend: &str, operation: &str, status: &str, duration: Duration) {
    histogram!("wedding_storage_operation_duration_seconds",
        "backend" => backend.to_string(),
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("wedding_storage_operations_total",
        "backend" => backend.to_string(),
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

// ============================================================================
// Admin Session Metrics
// ============================================================================

/// Record an admin login attempt.
///
/// Metric: `wedding_admin_logins_total`
/// Labels: `outcome` (success, invalid_credentials, error)
pub fn record_admin_login(outcome: &str) {
    counter!("wedding_admin_logins_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record a rejected admin token.
///
/// Metric: `wedding_admin_token_rejections_total`
/// Labels: `reason` (missing, malformed_header, too_large, invalid, expired, iat_in_future)
pub fn record_admin_token_rejection(reason: &str) {
    counter!("wedding_admin_token_rejections_total",
        "reason" => reason.to_string()
    )
    .increment(1);
}
