//! Middleware for the wedding service.
//!
//! # Components
//!
//! - `auth` - Bearer session check for admin routes
//! - `http_metrics` - HTTP request metrics

pub mod auth;
pub mod http_metrics;

pub use auth::require_admin;
pub use http_metrics::http_metrics_middleware;
