//! # Ledger
//!
//! A small banking ledger served over HTTP. Users register and log in, then
//! open accounts and move money between them. Every account and transfer
//! operation sits behind an authorization gate that accepts only encrypted,
//! time-limited session tokens issued at login.
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use ledger::{api::routes::create_router, AppState, LedgerConfig};
//!
//! let config = LedgerConfig::load("ledger.toml")?;
//! let state = AppState::from_config(config).await?;
//! let app = create_router(state);
//! ```
//!
//! ## Modules
//!
//! - [`api`] - REST API handlers and routes
//! - [`auth`] - Session tokens, password hashing and the auth middleware
//! - [`db`] - Store abstraction (in-process memory, SQLite via libsql)
//! - [`types`] - Request/response types and error handling
//! - [`utils`] - TOML configuration and request validation
//! - [`cli`] - Command-line parsing for the server binary

#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Session tokens and authentication middleware.
pub mod auth;
/// Command-line interface definitions.
pub mod cli;
/// Ledger persistence.
pub mod db;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration and validation utilities.
pub mod utils;

// Re-export commonly used types
pub use auth::{AuthContext, LocalTokenMaker, TokenMaker};
pub use db::{Store, StoreProvider};
pub use types::{AppError, Result};
pub use utils::{LedgerConfig, ValidationConfig};

use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// TOML-based configuration
    pub config: Arc<LedgerConfig>,
    /// Ledger store
    pub store: Arc<dyn Store>,
    /// Issues and verifies access tokens
    pub token_maker: Arc<dyn TokenMaker>,
    /// Currency set and field rules
    pub validation: Arc<ValidationConfig>,
}

impl AppState {
    /// Builds state around an existing store.
    ///
    /// Fails if the token key is missing or not exactly 32 bytes.
    pub fn new(config: LedgerConfig, store: Arc<dyn Store>) -> Result<Self> {
        let key = config
            .token_symmetric_key()
            .map_err(|e| AppError::Internal(e.to_string()))?;
        let token_maker = LocalTokenMaker::new(&key)?;
        let validation = ValidationConfig::from_section(&config.validation);

        Ok(Self {
            config: Arc::new(config),
            store,
            token_maker: Arc::new(token_maker),
            validation: Arc::new(validation),
        })
    }

    /// Builds state, opening the store named by `database.url`.
    pub async fn from_config(config: LedgerConfig) -> Result<Self> {
        let store = StoreProvider::from_url(&config.database.url)
            .create_store()
            .await?;
        Self::new(config, store)
    }
}
