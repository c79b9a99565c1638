use super::traits::{
    Account, CreateAccountParams, CreateUserParams, Entry, ListAccountsParams, Store, Transfer,
    TransferTxParams, TransferTxResult, User,
};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Builder, Connection, Database, Row};
use tokio::sync::Mutex;
use tracing::debug;

/// SQLite-backed store (local file or `:memory:`) using libsql.
///
/// A single connection is shared and serialized behind a mutex, which keeps
/// transfer transactions from interleaving on the same connection.
pub struct SqliteStore {
    _db: Database,
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub async fn new_local(path: &str) -> Result<Self> {
        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open database: {}", e)))?;

        let conn = db
            .connect()
            .map_err(|e| AppError::Database(format!("Failed to get connection: {}", e)))?;

        let store = Self {
            _db: db,
            conn: Mutex::new(conn),
        };
        store.initialize_schema().await?;

        Ok(store)
    }

    pub async fn new_memory() -> Result<Self> {
        Self::new_local(":memory:").await
    }

    async fn initialize_schema(&self) -> Result<()> {
        let conn = self.conn.lock().await;

        let statements = [
            "PRAGMA foreign_keys = ON",
            "CREATE TABLE IF NOT EXISTS users (
                username TEXT PRIMARY KEY,
                hashed_password TEXT NOT NULL,
                full_name TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password_changed_at TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner TEXT NOT NULL REFERENCES users(username),
                balance INTEGER NOT NULL,
                currency TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE (owner, currency)
            )",
            "CREATE INDEX IF NOT EXISTS idx_accounts_owner ON accounts(owner)",
            "CREATE TABLE IF NOT EXISTS entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                account_id INTEGER NOT NULL REFERENCES accounts(id),
                amount INTEGER NOT NULL,
                created_at TEXT NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS transfers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                from_account_id INTEGER NOT NULL REFERENCES accounts(id),
                to_account_id INTEGER NOT NULL REFERENCES accounts(id),
                amount INTEGER NOT NULL CHECK (amount > 0),
                created_at TEXT NOT NULL
            )",
        ];

        for sql in statements {
            conn.execute(sql, ())
                .await
                .map_err(|e| AppError::Database(format!("Failed to initialize schema: {}", e)))?;
        }

        debug!("database schema ready");
        Ok(())
    }
}

/// Maps constraint violations to `Conflict`, everything else to `Database`.
fn write_error(context: &str, err: libsql::Error) -> AppError {
    let message = err.to_string();
    if message.contains("UNIQUE constraint failed")
        || message.contains("FOREIGN KEY constraint failed")
    {
        AppError::Conflict(format!("{}: {}", context, message))
    } else {
        AppError::Database(format!("{}: {}", context, message))
    }
}

fn read_error(err: libsql::Error) -> AppError {
    AppError::Database(err.to_string())
}

fn parse_time(raw: String) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| AppError::Database(format!("Invalid timestamp '{}': {}", raw, e)))
}

fn user_from_row(row: &Row) -> Result<User> {
    Ok(User {
        username: row.get(0).map_err(read_error)?,
        hashed_password: row.get(1).map_err(read_error)?,
        full_name: row.get(2).map_err(read_error)?,
        email: row.get(3).map_err(read_error)?,
        password_changed_at: parse_time(row.get(4).map_err(read_error)?)?,
        created_at: parse_time(row.get(5).map_err(read_error)?)?,
    })
}

fn account_from_row(row: &Row) -> Result<Account> {
    Ok(Account {
        id: row.get(0).map_err(read_error)?,
        owner: row.get(1).map_err(read_error)?,
        balance: row.get(2).map_err(read_error)?,
        currency: row.get(3).map_err(read_error)?,
        created_at: parse_time(row.get(4).map_err(read_error)?)?,
    })
}

async fn fetch_account(conn: &Connection, id: i64) -> Result<Option<Account>> {
    let mut rows = conn
        .query(
            "SELECT id, owner, balance, currency, created_at FROM accounts WHERE id = ?",
            [id],
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to query account: {}", e)))?;

    match rows.next().await.map_err(read_error)? {
        Some(row) => Ok(Some(account_from_row(&row)?)),
        None => Ok(None),
    }
}

async fn insert_entry(conn: &Connection, account_id: i64, amount: i64, now: &str) -> Result<Entry> {
    conn.execute(
        "INSERT INTO entries (account_id, amount, created_at) VALUES (?, ?, ?)",
        (account_id, amount, now),
    )
    .await
    .map_err(|e| write_error("Failed to create entry", e))?;

    Ok(Entry {
        id: conn.last_insert_rowid(),
        account_id,
        amount,
        created_at: parse_time(now.to_string())?,
    })
}

// SQLite promotes an overflowing integer sum to REAL, so the new balance is
// computed here and written back as an exact integer.
async fn add_balance(conn: &Connection, account_id: i64, amount: i64) -> Result<Account> {
    let mut account = fetch_account(conn, account_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("account {} not found", account_id)))?;
    let balance = account
        .balance
        .checked_add(amount)
        .ok_or_else(|| AppError::InvalidInput("balance overflow".to_string()))?;

    conn.execute(
        "UPDATE accounts SET balance = ? WHERE id = ?",
        (balance, account_id),
    )
    .await
    .map_err(|e| write_error("Failed to update balance", e))?;

    account.balance = balance;
    Ok(account)
}

async fn apply_transfer(conn: &Connection, params: &TransferTxParams) -> Result<TransferTxResult> {
    for id in [params.from_account_id, params.to_account_id] {
        if fetch_account(conn, id).await?.is_none() {
            return Err(AppError::NotFound(format!("account {} not found", id)));
        }
    }

    let now = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO transfers (from_account_id, to_account_id, amount, created_at)
          VALUES (?, ?, ?, ?)",
        (
            params.from_account_id,
            params.to_account_id,
            params.amount,
            now.as_str(),
        ),
    )
    .await
    .map_err(|e| write_error("Failed to create transfer", e))?;

    let transfer = Transfer {
        id: conn.last_insert_rowid(),
        from_account_id: params.from_account_id,
        to_account_id: params.to_account_id,
        amount: params.amount,
        created_at: parse_time(now.clone())?,
    };

    let from_entry = insert_entry(conn, params.from_account_id, -params.amount, &now).await?;
    let to_entry = insert_entry(conn, params.to_account_id, params.amount, &now).await?;

    // Update in ascending id order so concurrent writers agree on lock order.
    let (from_account, to_account) = if params.from_account_id < params.to_account_id {
        let from = add_balance(conn, params.from_account_id, -params.amount).await?;
        let to = add_balance(conn, params.to_account_id, params.amount).await?;
        (from, to)
    } else {
        let to = add_balance(conn, params.to_account_id, params.amount).await?;
        let from = add_balance(conn, params.from_account_id, -params.amount).await?;
        (from, to)
    };

    Ok(TransferTxResult {
        transfer,
        from_account,
        to_account,
        from_entry,
        to_entry,
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn create_user(&self, params: CreateUserParams) -> Result<User> {
        let conn = self.conn.lock().await;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO users (username, hashed_password, full_name, email, password_changed_at, created_at)
              VALUES (?, ?, ?, ?, ?, ?)",
            (
                params.username.as_str(),
                params.hashed_password.as_str(),
                params.full_name.as_str(),
                params.email.as_str(),
                now.as_str(),
                now.as_str(),
            ),
        )
        .await
        .map_err(|e| write_error("Failed to create user", e))?;

        let created_at = parse_time(now)?;
        Ok(User {
            username: params.username,
            hashed_password: params.hashed_password,
            full_name: params.full_name,
            email: params.email,
            password_changed_at: created_at,
            created_at,
        })
    }

    async fn get_user(&self, username: &str) -> Result<Option<User>> {
        let conn = self.conn.lock().await;

        let mut rows = conn
            .query(
                "SELECT username, hashed_password, full_name, email, password_changed_at, created_at
                 FROM users WHERE username = ?",
                [username],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query user: {}", e)))?;

        match rows.next().await.map_err(read_error)? {
            Some(row) => Ok(Some(user_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn create_account(&self, params: CreateAccountParams) -> Result<Account> {
        let conn = self.conn.lock().await;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO accounts (owner, balance, currency, created_at) VALUES (?, ?, ?, ?)",
            (
                params.owner.as_str(),
                params.balance,
                params.currency.as_str(),
                now.as_str(),
            ),
        )
        .await
        .map_err(|e| write_error("Failed to create account", e))?;

        Ok(Account {
            id: conn.last_insert_rowid(),
            owner: params.owner,
            balance: params.balance,
            currency: params.currency,
            created_at: parse_time(now)?,
        })
    }

    async fn get_account(&self, id: i64) -> Result<Option<Account>> {
        let conn = self.conn.lock().await;
        fetch_account(&conn, id).await
    }

    async fn list_accounts(&self, params: ListAccountsParams) -> Result<Vec<Account>> {
        let conn = self.conn.lock().await;

        let mut rows = conn
            .query(
                "SELECT id, owner, balance, currency, created_at FROM accounts
                 WHERE owner = ? ORDER BY id LIMIT ? OFFSET ?",
                (params.owner.as_str(), params.limit, params.offset),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to list accounts: {}", e)))?;

        let mut accounts = Vec::new();
        while let Some(row) = rows.next().await.map_err(read_error)? {
            accounts.push(account_from_row(&row)?);
        }

        Ok(accounts)
    }

    async fn transfer_tx(&self, params: TransferTxParams) -> Result<TransferTxResult> {
        let conn = self.conn.lock().await;

        let tx = conn
            .transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        match apply_transfer(&tx, &params).await {
            Ok(result) => {
                tx.commit()
                    .await
                    .map_err(|e| AppError::Database(format!("Failed to commit transfer: {}", e)))?;
                debug!(
                    transfer_id = result.transfer.id,
                    from = params.from_account_id,
                    to = params.to_account_id,
                    "transfer committed"
                );
                Ok(result)
            }
            Err(err) => {
                if let Err(e) = tx.rollback().await {
                    tracing::warn!(error = %e, "failed to roll back transfer");
                }
                Err(err)
            }
        }
    }
}
