//! Session tokens and the authentication gate
//!
//! This module is the only place where "who is making this request" is
//! decided.
//!
//! # Module Structure
//!
//! - [`auth::token`](crate::auth::token) - Claims payload, token errors, the `TokenMaker` trait and clocks
//! - [`auth::paseto`](crate::auth::paseto) - `v2.local` tokens sealed with XChaCha20-Poly1305
//! - [`auth::middleware`](crate::auth::middleware) - Axum middleware and the `AuthContext` extractor
//! - [`auth::password`](crate::auth::password) - Argon2id password hashing
//!
//! # Usage
//!
//! ## Token Issuance
//!
//! ```ignore
//! use ledger::auth::{LocalTokenMaker, TokenMaker};
//!
//! let maker = LocalTokenMaker::new(key.as_bytes())?;
//! let (token, payload) = maker.create_token("alice", chrono::Duration::minutes(15))?;
//! ```
//!
//! ## Middleware
//!
//! ```ignore
//! let protected = Router::new()
//!     .route("/accounts", get(list_accounts))
//!     .route_layer(middleware::from_fn(move |req, next| {
//!         ledger::auth::middleware::auth_middleware(maker.clone(), req, next)
//!     }));
//! ```
//!
//! ## Reading the Identity in Handlers
//!
//! ```ignore
//! async fn handler(auth: AuthContext) -> String {
//!     format!("Hello, {}!", auth.username())
//! }
//! ```
//!
//! Tokens are stateless: nothing is stored server side, and a token stays
//! valid until its `expired_at` passes.

/// Authentication middleware and extractors for protected routes.
pub mod middleware;
/// `v2.local` token maker.
pub mod paseto;
/// Password hashing.
pub mod password;
/// Token payload, errors and maker abstraction.
pub mod token;

pub use middleware::{authorize, AuthContext, AuthError};
pub use paseto::{LocalTokenMaker, SYMMETRIC_KEY_LEN};
pub use token::{Clock, Payload, SystemClock, TokenError, TokenMaker};
