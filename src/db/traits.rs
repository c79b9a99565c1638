//! Store abstraction traits
//!
//! This module provides the `Store` trait that abstracts over the ledger
//! persistence backends (in-process memory, local SQLite via libsql).
//!
//! # Example
//!
//! ```rust,ignore
//! use ledger::db::StoreProvider;
//!
//! // Use the in-process store (default for development/testing)
//! let store = StoreProvider::Memory.create_store().await?;
//!
//! // Use a SQLite file
//! let store = StoreProvider::Sqlite { path: "ledger.db".into() }.create_store().await?;
//! ```

use crate::types::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub full_name: String,
    pub email: String,
    pub password_changed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Account record. Balances are in minor currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub owner: String,
    pub balance: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

/// One side of a money movement on a single account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    pub account_id: i64,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: i64,
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateUserParams {
    pub username: String,
    pub hashed_password: String,
    pub full_name: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct CreateAccountParams {
    pub owner: String,
    pub balance: i64,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct ListAccountsParams {
    pub owner: String,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone)]
pub struct TransferTxParams {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: i64,
}

/// Everything written by one transfer.
#[derive(Debug, Clone)]
pub struct TransferTxResult {
    pub transfer: Transfer,
    pub from_account: Account,
    pub to_account: Account,
    pub from_entry: Entry,
    pub to_entry: Entry,
}

/// Abstract trait for ledger persistence
///
/// Handlers only ever reach the store after the auth gate has run, and scope
/// every query by the authenticated username themselves.
#[async_trait]
pub trait Store: Send + Sync {
    // ============== User Operations ==============

    /// Creates a user. Duplicate username or email fails with `Conflict`.
    async fn create_user(&self, params: CreateUserParams) -> Result<User>;

    async fn get_user(&self, username: &str) -> Result<Option<User>>;

    // ============== Account Operations ==============

    /// Creates an account. Unknown owner or a second account in the same
    /// currency for the same owner fails with `Conflict`.
    async fn create_account(&self, params: CreateAccountParams) -> Result<Account>;

    async fn get_account(&self, id: i64) -> Result<Option<Account>>;

    /// Lists one owner's accounts ordered by id.
    async fn list_accounts(&self, params: ListAccountsParams) -> Result<Vec<Account>>;

    // ============== Transfer Operations ==============

    /// Moves `amount` between two accounts in one atomic step: records the
    /// transfer, a debit and a credit entry, and updates both balances.
    async fn transfer_tx(&self, params: TransferTxParams) -> Result<TransferTxResult>;
}
