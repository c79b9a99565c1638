//! Ledger persistence.
//!
//! This module provides the [`Store`] trait and its backends:
//! - **Memory**: in-process tables, used for development and tests
//! - **SQLite**: local file or `:memory:` database via libsql
//!
//! The backend is picked from `database.url` in the config file, see
//! [`StoreProvider::from_url`].

#![allow(missing_docs)]

pub mod memory;
pub mod sqlite;
pub mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{
    Account, CreateAccountParams, CreateUserParams, Entry, ListAccountsParams, Store, Transfer,
    TransferTxParams, TransferTxResult, User,
};

use crate::types::Result;
use std::sync::Arc;

/// URL selecting the in-process store.
pub const MEMORY_URL: &str = ":memory:";

/// Which store backend to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreProvider {
    Memory,
    Sqlite { path: String },
}

impl StoreProvider {
    /// Maps a database URL to a provider.
    ///
    /// `:memory:` selects the in-process store. Anything else is a SQLite
    /// file path, with an optional `sqlite://` prefix.
    pub fn from_url(url: &str) -> Self {
        if url == MEMORY_URL {
            return StoreProvider::Memory;
        }

        let path = url.strip_prefix("sqlite://").unwrap_or(url);
        StoreProvider::Sqlite {
            path: path.to_string(),
        }
    }

    pub async fn create_store(&self) -> Result<Arc<dyn Store>> {
        match self {
            StoreProvider::Memory => Ok(Arc::new(MemoryStore::new())),
            StoreProvider::Sqlite { path } => Ok(Arc::new(SqliteStore::new_local(path).await?)),
        }
    }
}
