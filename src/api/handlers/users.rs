use crate::{
    auth::password::{hash_password, verify_password},
    db::CreateUserParams,
    types::{AppError, CreateUserRequest, LoginUserRequest, LoginUserResponse, Result, UserResponse},
    AppState,
};
use axum::{extract::State, Json};
use tracing::info;

/// Register a new user
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<UserResponse>> {
    state.validation.validate_username(&payload.username)?;
    state.validation.validate_password(&payload.password)?;
    state.validation.validate_email(&payload.email)?;
    if payload.full_name.trim().is_empty() {
        return Err(AppError::InvalidInput("full_name is required".to_string()));
    }

    let hashed_password = hash_password(&payload.password)?;

    let user = state
        .store
        .create_user(CreateUserParams {
            username: payload.username,
            hashed_password,
            full_name: payload.full_name,
            email: payload.email,
        })
        .await?;

    info!(username = %user.username, "user registered");
    Ok(Json(user.into()))
}

/// Login with username and password, returning an access token
pub async fn login_user(
    State(state): State<AppState>,
    Json(payload): Json<LoginUserRequest>,
) -> Result<Json<LoginUserResponse>> {
    state.validation.validate_username(&payload.username)?;
    state.validation.validate_password(&payload.password)?;

    let user = state
        .store
        .get_user(&payload.username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {} not found", payload.username)))?;

    if !verify_password(&payload.password, &user.hashed_password)? {
        return Err(AppError::Auth("incorrect password".to_string()));
    }

    let (access_token, payload) = state
        .token_maker
        .create_token(&user.username, state.config.access_token_duration())
        .map_err(|e| AppError::Internal(format!("failed to create access token: {}", e)))?;

    info!(username = %user.username, "user logged in");
    Ok(Json(LoginUserResponse {
        access_token,
        access_token_expires_at: payload.expired_at(),
        user: user.into(),
    }))
}
