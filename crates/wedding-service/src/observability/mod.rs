//! Observability for the wedding service.
//!
//! Provides metrics definitions and recording helpers.

pub mod metrics;
