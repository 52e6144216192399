use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use secrecy::SecretString;
use serde::Serialize;
use service_core::error::AppError;

use crate::{
    dtos::auth::LoginRequest,
    middleware::CurrentAuth,
    models::{AccountResponse, AuthContext},
    utils::ValidatedJson,
    AppState,
};

/// Login with email and password
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let password = SecretString::new(req.password);
    let token = state.accounts.login(&req.email, &password).await?;
    Ok((StatusCode::OK, Json(token)))
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub account: AccountResponse,
    pub auth: AuthContext,
}

/// Current account for a bearer token
pub async fn me(
    State(state): State<AppState>,
    CurrentAuth(context): CurrentAuth,
) -> Result<impl IntoResponse, AppError> {
    let account = state.accounts.current_account(&context).await?;
    Ok(Json(MeResponse {
        account: account.into(),
        auth: context,
    }))
}
