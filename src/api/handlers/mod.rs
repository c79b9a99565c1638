//! API request handlers.
//!
//! This module contains all HTTP request handlers organized by resource.

/// Account creation and lookup handlers.
pub mod accounts;
/// Money transfer handlers.
pub mod transfers;
/// Registration and login handlers.
pub mod users;

/// Liveness probe.
pub async fn health() -> &'static str {
    "OK"
}
