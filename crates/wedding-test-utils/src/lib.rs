//! # Wedding Test Utilities
//!
//! Shared test utilities for the wedding service.
//!
//! This crate provides:
//! - Server test harness (`TestWeddingServer` for E2E tests) backed by an
//!   in-memory blob store
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wedding_test_utils::*;
//!
//! #[sqlx::test(migrations = "../../migrations")]
//! async fn test_example(pool: PgPool) -> Result<()> {
//!     let server = TestWeddingServer::spawn(pool).await?;
//!     let token = server.admin_token().await?;
//!
//!     let response = server
//!         .client()
//!         .get(format!("{}/api/v1/admin/rsvps", server.url()))
//!         .bearer_auth(&token)
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod server_harness;

pub use server_harness::*;
