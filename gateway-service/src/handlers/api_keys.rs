use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{
    dtos::api_keys::{ApiKeyCreatedResponse, CreateApiKeyRequest},
    middleware::CurrentAuth,
    utils::ValidatedJson,
    AppState,
};

/// Issue an API key. The plaintext secret is in this response and nowhere
/// else.
pub async fn create_api_key(
    State(state): State<AppState>,
    CurrentAuth(caller): CurrentAuth,
    ValidatedJson(req): ValidatedJson<CreateApiKeyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let issued = state.accounts.create_api_key(&caller, req.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiKeyCreatedResponse::from(issued))))
}
