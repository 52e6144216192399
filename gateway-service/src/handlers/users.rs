use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use secrecy::SecretString;
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::users::{BootstrapRequest, CreateUserRequest, UpdateUserRequest},
    middleware::CurrentAuth,
    models::AccountResponse,
    utils::ValidatedJson,
    AppState,
};

/// Create the first superadmin. Only works while no account exists.
pub async fn bootstrap(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<BootstrapRequest>,
) -> Result<impl IntoResponse, AppError> {
    let account = state
        .accounts
        .bootstrap(&req.email, SecretString::new(req.password))
        .await?;
    Ok((StatusCode::CREATED, Json(AccountResponse::from(account))))
}

pub async fn create_user(
    State(state): State<AppState>,
    CurrentAuth(caller): CurrentAuth,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(caller = %caller.account_id(), "Creating account");
    let account = state.accounts.create_user(req.into()).await?;
    Ok((StatusCode::CREATED, Json(AccountResponse::from(account))))
}

pub async fn update_user(
    State(state): State<AppState>,
    CurrentAuth(caller): CurrentAuth,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(caller = %caller.account_id(), account_id = %id, "Updating account");
    let account = state.accounts.update_user(id, req.into()).await?;
    Ok(Json(AccountResponse::from(account)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    CurrentAuth(caller): CurrentAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(caller = %caller.account_id(), account_id = %id, "Deleting account");
    state.accounts.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
