//! Wedding Site Service Library
//!
//! Backend for a wedding website:
//!
//! - Public RSVP form with named guests
//! - Witnesses, contacts and the color palette shown on the site
//! - Curated, orderable photo gallery
//! - Guest photo uploads per reception table, reached through table QR codes
//! - Password-protected admin console with short-lived session tokens
//!
//! # Architecture
//!
//! Handler -> Service -> Repository, with uploaded binaries kept in a
//! [`services::BlobStore`] (local disk or S3) and metadata in PostgreSQL:
//!
//! ```text
//! routes/mod.rs -> handlers/*.rs -> services/*.rs -> repositories/*.rs
//! ```
//!
//! # Modules
//!
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Admin authentication and HTTP metrics
//! - `models` - Data models and request validation
//! - `observability` - Prometheus metrics
//! - `repositories` - Database access
//! - `routes` - Axum router setup
//! - `services` - Uploads, storage, admin sessions, QR codes

pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod services;
