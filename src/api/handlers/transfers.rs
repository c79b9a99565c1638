use crate::{
    auth::AuthContext,
    db::{Account, TransferTxParams},
    types::{AppError, Result, TransferRequest, TransferResponse},
    AppState,
};
use axum::{extract::State, Json};
use tracing::info;

/// Move money out of one of the caller's accounts
pub async fn create_transfer(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(payload): Json<TransferRequest>,
) -> Result<Json<TransferResponse>> {
    state.validation.validate_account_id(payload.from_account_id)?;
    state.validation.validate_account_id(payload.to_account_id)?;
    state.validation.validate_amount(payload.amount)?;
    state.validation.validate_currency(&payload.currency)?;

    if payload.from_account_id == payload.to_account_id {
        return Err(AppError::InvalidInput(
            "cannot transfer to the same account".to_string(),
        ));
    }

    let from_account = valid_account(&state, payload.from_account_id, &payload.currency).await?;
    if from_account.owner != auth.username() {
        return Err(AppError::Auth(
            "from account doesn't belong to the authenticated user".to_string(),
        ));
    }

    valid_account(&state, payload.to_account_id, &payload.currency).await?;

    let result = state
        .store
        .transfer_tx(TransferTxParams {
            from_account_id: payload.from_account_id,
            to_account_id: payload.to_account_id,
            amount: payload.amount,
        })
        .await?;

    info!(
        transfer_id = result.transfer.id,
        from = payload.from_account_id,
        to = payload.to_account_id,
        amount = payload.amount,
        "transfer created"
    );

    Ok(Json(TransferResponse {
        transfer: result.transfer,
        from_account: result.from_account,
        to_account: result.to_account,
        from_entry: result.from_entry,
        to_entry: result.to_entry,
    }))
}

/// Loads an account and checks it is held in `currency`.
async fn valid_account(state: &AppState, id: i64, currency: &str) -> Result<Account> {
    let account = state
        .store
        .get_account(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("account {} not found", id)))?;

    if account.currency != currency {
        return Err(AppError::InvalidInput(format!(
            "account [{}] currency mismatch: {} vs {}",
            account.id, account.currency, currency
        )));
    }

    Ok(account)
}
