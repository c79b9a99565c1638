//! In-process store.
//!
//! All tables live behind one mutex so a transfer is observed either fully
//! applied or not at all.

use super::traits::{
    Account, CreateAccountParams, CreateUserParams, Entry, ListAccountsParams, Store, Transfer,
    TransferTxParams, TransferTxResult, User,
};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<String, User>,
    accounts: BTreeMap<i64, Account>,
    entries: Vec<Entry>,
    transfers: Vec<Transfer>,
}

impl Tables {
    fn next_account_id(&self) -> i64 {
        self.accounts.keys().next_back().map_or(1, |id| id + 1)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries recorded against `account_id`.
    pub fn entry_count(&self, account_id: i64) -> usize {
        self.tables
            .lock()
            .entries
            .iter()
            .filter(|e| e.account_id == account_id)
            .count()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, params: CreateUserParams) -> Result<User> {
        let mut tables = self.tables.lock();

        if tables.users.contains_key(&params.username) {
            return Err(AppError::Conflict(format!(
                "username {} already exists",
                params.username
            )));
        }
        if tables.users.values().any(|u| u.email == params.email) {
            return Err(AppError::Conflict(format!(
                "email {} already exists",
                params.email
            )));
        }

        let now = Utc::now();
        let user = User {
            username: params.username,
            hashed_password: params.hashed_password,
            full_name: params.full_name,
            email: params.email,
            password_changed_at: now,
            created_at: now,
        };
        tables.users.insert(user.username.clone(), user.clone());

        Ok(user)
    }

    async fn get_user(&self, username: &str) -> Result<Option<User>> {
        Ok(self.tables.lock().users.get(username).cloned())
    }

    async fn create_account(&self, params: CreateAccountParams) -> Result<Account> {
        let mut tables = self.tables.lock();

        if !tables.users.contains_key(&params.owner) {
            return Err(AppError::Conflict(format!(
                "owner {} does not exist",
                params.owner
            )));
        }
        if tables
            .accounts
            .values()
            .any(|a| a.owner == params.owner && a.currency == params.currency)
        {
            return Err(AppError::Conflict(format!(
                "{} already has a {} account",
                params.owner, params.currency
            )));
        }

        let account = Account {
            id: tables.next_account_id(),
            owner: params.owner,
            balance: params.balance,
            currency: params.currency,
            created_at: Utc::now(),
        };
        tables.accounts.insert(account.id, account.clone());

        Ok(account)
    }

    async fn get_account(&self, id: i64) -> Result<Option<Account>> {
        Ok(self.tables.lock().accounts.get(&id).cloned())
    }

    async fn list_accounts(&self, params: ListAccountsParams) -> Result<Vec<Account>> {
        let limit = usize::try_from(params.limit)
            .map_err(|_| AppError::InvalidInput("limit must not be negative".to_string()))?;
        let offset = usize::try_from(params.offset)
            .map_err(|_| AppError::InvalidInput("offset must not be negative".to_string()))?;

        Ok(self
            .tables
            .lock()
            .accounts
            .values()
            .filter(|a| a.owner == params.owner)
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn transfer_tx(&self, params: TransferTxParams) -> Result<TransferTxResult> {
        let mut tables = self.tables.lock();

        let balance_of = |tables: &Tables, id: i64| {
            tables
                .accounts
                .get(&id)
                .map(|a| a.balance)
                .ok_or_else(|| AppError::NotFound(format!("account {} not found", id)))
        };

        // Work out both balances before touching anything so a failure
        // leaves the tables unchanged.
        let from_balance = balance_of(&*tables, params.from_account_id)?
            .checked_sub(params.amount)
            .ok_or_else(|| AppError::InvalidInput("balance overflow".to_string()))?;
        let to_base = if params.to_account_id == params.from_account_id {
            from_balance
        } else {
            balance_of(&*tables, params.to_account_id)?
        };
        let to_balance = to_base
            .checked_add(params.amount)
            .ok_or_else(|| AppError::InvalidInput("balance overflow".to_string()))?;

        let now = Utc::now();
        let transfer = Transfer {
            id: tables.transfers.len() as i64 + 1,
            from_account_id: params.from_account_id,
            to_account_id: params.to_account_id,
            amount: params.amount,
            created_at: now,
        };
        tables.transfers.push(transfer.clone());

        let from_entry = Entry {
            id: tables.entries.len() as i64 + 1,
            account_id: params.from_account_id,
            amount: -params.amount,
            created_at: now,
        };
        tables.entries.push(from_entry.clone());

        let to_entry = Entry {
            id: tables.entries.len() as i64 + 1,
            account_id: params.to_account_id,
            amount: params.amount,
            created_at: now,
        };
        tables.entries.push(to_entry.clone());

        let from_account = set_balance(&mut tables, params.from_account_id, from_balance)?;
        let to_account = set_balance(&mut tables, params.to_account_id, to_balance)?;

        Ok(TransferTxResult {
            transfer,
            from_account,
            to_account,
            from_entry,
            to_entry,
        })
    }
}

fn set_balance(tables: &mut Tables, account_id: i64, balance: i64) -> Result<Account> {
    let account = tables
        .accounts
        .get_mut(&account_id)
        .ok_or_else(|| AppError::NotFound(format!("account {} not found", account_id)))?;
    account.balance = balance;
    Ok(account.clone())
}
