//! HTTP API Handlers and Routes
//!
//! This module provides the REST API layer of the ledger, built on the Axum
//! web framework.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route table and router configuration
//!
//! # API Endpoints
//!
//! ## Users
//! - `POST /users` - Register new user
//! - `POST /users/login` - Login and receive an access token
//!
//! ## Accounts
//! - `POST /accounts` - Open an account for the caller
//! - `GET /accounts/{id}` - Get one of the caller's accounts
//! - `GET /accounts?page_id=&page_size=` - List the caller's accounts
//!
//! ## Transfers
//! - `POST /transfers` - Move money out of one of the caller's accounts
//!
//! ## Health
//! - `GET /health` - Health check endpoint
//!
//! # Authentication
//!
//! Account and transfer endpoints require an access token in the
//! `Authorization` header:
//! ```text
//! Authorization: Bearer <token>
//! ```

/// Request handlers for all API endpoints.
pub mod handlers;
/// Route table and router configuration.
pub mod routes;
