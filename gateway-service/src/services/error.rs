use service_core::error::AppError;
use thiserror::Error;

use crate::models::Role;

/// Gateway failure taxonomy.
///
/// Verification and authorization variants are routine, terminal outcomes for
/// a request. A non-transactional multi-write that leaves an orphaned external
/// identity or operator record (a consistency gap) is not detected and so has
/// no variant; see the compensation in `AccountService::create_user`.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Use either a bearer token or an API key, not both")]
    AmbiguousCredential,

    #[error("Authentication required")]
    AuthenticationRequired,

    /// Uniform for bad/expired/mis-signed tokens and unknown/inactive keys.
    #[error("Invalid credential")]
    InvalidCredential,

    #[error("Account disabled")]
    AccountDisabled,

    #[error("Insufficient permissions")]
    InsufficientRole { required: Role, actual: Role },

    #[error("Operator access required")]
    OperatorCapabilityRequired,

    #[error("Identity provisioning failed: {0}")]
    Provision(anyhow::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store error: {0}")]
    Store(anyhow::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    /// Short machine-readable code for response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::AmbiguousCredential => "ambiguous_credential",
            ServiceError::AuthenticationRequired => "authentication_required",
            ServiceError::InvalidCredential => "invalid_credential",
            ServiceError::AccountDisabled => "account_disabled",
            ServiceError::InsufficientRole { .. } => "insufficient_role",
            ServiceError::OperatorCapabilityRequired => "operator_required",
            ServiceError::Provision(_) => "provision_failed",
            ServiceError::Validation(_) => "validation_error",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::Store(_) | ServiceError::Internal(_) => "internal_error",
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::AmbiguousCredential => {
                AppError::BadRequest(anyhow::anyhow!("Use either a bearer token or an API key, not both"))
            }
            ServiceError::AuthenticationRequired => {
                AppError::AuthError(anyhow::anyhow!("Authentication required"))
            }
            ServiceError::InvalidCredential => {
                AppError::AuthError(anyhow::anyhow!("Invalid credential"))
            }
            ServiceError::AccountDisabled => AppError::AuthError(anyhow::anyhow!("Account disabled")),
            ServiceError::InsufficientRole { .. } => {
                AppError::Forbidden(anyhow::anyhow!("Insufficient permissions"))
            }
            ServiceError::OperatorCapabilityRequired => {
                AppError::Forbidden(anyhow::anyhow!("Operator access required"))
            }
            ServiceError::Provision(e) => {
                tracing::error!(error = %e, "Identity provisioning failed");
                AppError::BadGateway("identity provisioning failed".to_string())
            }
            ServiceError::Validation(msg) => AppError::UnprocessableEntity(anyhow::anyhow!(msg)),
            ServiceError::NotFound(msg) => AppError::NotFound(anyhow::anyhow!(msg)),
            ServiceError::Conflict(msg) => AppError::Conflict(anyhow::anyhow!(msg)),
            ServiceError::Store(e) => AppError::DatabaseError(e),
            ServiceError::Internal(e) => AppError::InternalError(e),
        }
    }
}
