//! Shared building blocks for the customer accounts workspace.
//!
//! Holds response types used across crates and the tracing setup helpers.

pub mod types;
pub mod utils;
