//! Service layer for the wedding service.
//!
//! # Components
//!
//! - `admin_auth` - admin password check and session tokens
//! - `qr` - table QR code rendering
//! - `storage` - blob store backends for uploaded images
//! - `uploads` - upload-and-register with compensation, and media deletes

pub mod admin_auth;
pub mod qr;
pub mod storage;
pub mod uploads;

pub use admin_auth::AdminAuthService;
pub use storage::BlobStore;
pub use uploads::UploadService;
