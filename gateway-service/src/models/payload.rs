//! Write payloads handed to the lifecycle hooks by the CRUD layer, and the
//! validated drafts the hooks hand back.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    Create,
    Update,
}

/// Inbound user write. `role` stays a raw string until the hook validates it;
/// `is_operator` and `password` are input-only.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserWritePayload {
    pub id: Option<Uuid>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub identity_id: Option<String>,
    pub operator_id: Option<Uuid>,
    pub active: Option<bool>,
    #[serde(default)]
    pub is_operator: bool,
    pub password: Option<SecretString>,
}

/// User payload after the before-write hook. Transient fields do not exist
/// on this type, so they cannot reach the persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_id: Option<String>,
    pub operator_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

/// Inbound API key write.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiKeyWritePayload {
    pub account_id: Option<Uuid>,
    pub name: Option<String>,
    pub role: Option<Role>,
    pub operator_id: Option<Uuid>,
    #[serde(skip)]
    pub key_hash: Option<String>,
    pub active: Option<bool>,
}

/// API key payload after the before-write hook. `secret` is out-of-band:
/// the CRUD layer returns it to the creator once and never stores it.
#[derive(Debug)]
pub struct PreparedApiKey {
    pub payload: ApiKeyWritePayload,
    pub secret: Option<SecretString>,
}
