//! Common utilities shared across the wedding site crates.

#![warn(clippy::pedantic)]

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for admin session tokens (issue, verify, claims, constants)
pub mod jwt;
