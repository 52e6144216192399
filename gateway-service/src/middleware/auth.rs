use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use service_core::error::AppError;

use crate::{
    models::{AuthContext, CredentialKind, Role},
    services::{AuthFailure, AuthRequirement, ServiceError},
    AppState,
};

/// Authenticate the request and enforce `requirement`. On success the
/// [`AuthContext`] is placed in the request extensions.
pub async fn require_auth(
    State((state, requirement)): State<(AppState, AuthRequirement)>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthRejection> {
    let context = state
        .auth
        .authenticate(req.headers(), &requirement)
        .await
        .map_err(AuthRejection)?;

    req.extensions_mut().insert(context);
    Ok(next.run(req).await)
}

/// Bearer-token-only authentication with no store lookups and no
/// requirement checks.
pub async fn require_token(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthRejection> {
    let context = state
        .auth
        .authenticate_token(req.headers())
        .map_err(AuthRejection)?;

    req.extensions_mut().insert(context);
    Ok(next.run(req).await)
}

#[derive(Debug, Serialize)]
pub struct AuthErrorBody {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<Role>,
}

/// Rejection rendered by the auth middleware.
#[derive(Debug)]
pub struct AuthRejection(pub AuthFailure);

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let AuthFailure { error, kind } = self.0;

        let status = match &error {
            ServiceError::AmbiguousCredential => StatusCode::BAD_REQUEST,
            ServiceError::AuthenticationRequired
            | ServiceError::InvalidCredential
            | ServiceError::AccountDisabled => StatusCode::UNAUTHORIZED,
            ServiceError::InsufficientRole { .. } | ServiceError::OperatorCapabilityRequired => {
                StatusCode::FORBIDDEN
            }
            other => {
                // Fail closed.
                tracing::error!(error = %other, "Authentication failed unexpectedly");
                let body = AuthErrorBody {
                    error: "authentication_failed",
                    message: "Authentication failed".to_string(),
                    required: None,
                    actual: None,
                };
                return (StatusCode::UNAUTHORIZED, Json(body)).into_response();
            }
        };

        let (required, actual) = match (&error, kind) {
            (
                ServiceError::InsufficientRole { required, actual },
                Some(CredentialKind::ApiKey),
            ) => (Some(*required), Some(*actual)),
            _ => (None, None),
        };

        tracing::debug!(code = error.code(), kind = ?kind, "Request rejected");

        let body = AuthErrorBody {
            error: error.code(),
            message: error.to_string(),
            required,
            actual,
        };
        (status, Json(body)).into_response()
    }
}

/// Extractor for the context placed by [`require_auth`] or [`require_token`].
pub struct CurrentAuth(pub AuthContext);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let context = parts.extensions.get::<AuthContext>().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "Auth context missing from request extensions"
            ))
        })?;

        Ok(CurrentAuth(context.clone()))
    }
}
