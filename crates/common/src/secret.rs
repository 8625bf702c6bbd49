//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports [`secrecy`] types. Use them for the admin password, its bcrypt
//! hash, the session signing secret, and issued session tokens.
//!
//! `SecretString` implements `Debug` with redaction, so any struct deriving
//! `Debug` that holds one is safe to log via `{:?}` or tracing. Values are
//! zeroized on drop.
//!
//! # Example
//!
//! ```rust
//! use common::secret::SecretString;
//! use secrecy::ExposeSecret;
//!
//! #[derive(Debug)]
//! struct LoginRequest {
//!     password: SecretString,
//! }
//!
//! let req = LoginRequest {
//!     password: SecretString::from("hunter2"),
//! };
//!
//! assert!(!format!("{req:?}").contains("hunter2"));
//! let password: &str = req.password.expose_secret();
//! assert_eq!(password, "hunter2");
//! ```

pub use secrecy::{ExposeSecret, SecretBox, SecretString};
