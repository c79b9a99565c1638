//! Account handlers.
//!
//! Every operation is scoped to the username carried by the verified token:
//! accounts are created for the caller and only the caller's accounts are
//! readable.

use crate::{
    auth::AuthContext,
    db::{Account, CreateAccountParams, ListAccountsParams},
    types::{AppError, CreateAccountRequest, ListAccountsQuery, Result},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::info;

/// Open a zero-balance account for the authenticated user
pub async fn create_account(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(payload): Json<CreateAccountRequest>,
) -> Result<Json<Account>> {
    state.validation.validate_currency(&payload.currency)?;

    let account = state
        .store
        .create_account(CreateAccountParams {
            owner: auth.username().to_string(),
            balance: 0,
            currency: payload.currency,
        })
        .await?;

    info!(account_id = account.id, owner = %account.owner, "account created");
    Ok(Json(account))
}

/// Get one of the authenticated user's accounts
pub async fn get_account(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
) -> Result<Json<Account>> {
    state.validation.validate_account_id(id)?;

    let account = state
        .store
        .get_account(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("account {} not found", id)))?;

    if account.owner != auth.username() {
        return Err(AppError::Auth(
            "account doesn't belong to the authenticated user".to_string(),
        ));
    }

    Ok(Json(account))
}

/// List the authenticated user's accounts, one page at a time
pub async fn list_accounts(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<ListAccountsQuery>,
) -> Result<Json<Vec<Account>>> {
    let (limit, offset) = state
        .validation
        .validate_page(query.page_id, query.page_size)?;

    let accounts = state
        .store
        .list_accounts(ListAccountsParams {
            owner: auth.username().to_string(),
            limit,
            offset,
        })
        .await?;

    Ok(Json(accounts))
}
