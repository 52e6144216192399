use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{ApiKeyWritePayload, Role};
use crate::services::IssuedApiKey;

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateApiKeyRequest {
    /// Defaults to the caller's account.
    pub account_id: Option<Uuid>,

    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,
}

impl From<CreateApiKeyRequest> for ApiKeyWritePayload {
    fn from(req: CreateApiKeyRequest) -> Self {
        Self {
            account_id: req.account_id,
            name: req.name,
            ..Default::default()
        }
    }
}

/// Creation response. `key` is the only time the plaintext secret is shown.
#[derive(Debug, Serialize)]
pub struct ApiKeyCreatedResponse {
    pub id: Uuid,
    pub account_id: Uuid,
    pub name: Option<String>,
    pub role: Role,
    pub operator_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub key: String,
}

impl From<IssuedApiKey> for ApiKeyCreatedResponse {
    fn from(issued: IssuedApiKey) -> Self {
        Self {
            id: issued.key.id,
            account_id: issued.key.account_id,
            name: issued.key.name,
            role: issued.key.role,
            operator_id: issued.key.operator_id,
            created_at: issued.key.created_at,
            key: issued.secret.expose_secret().clone(),
        }
    }
}
