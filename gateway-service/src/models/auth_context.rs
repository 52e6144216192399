//! Per-request authentication context produced by the resolver.

use serde::Serialize;
use uuid::Uuid;

use super::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    User,
    ApiKey,
}

/// Immutable identity of the caller. `api_key_id` is present iff the kind is
/// [`CredentialKind::ApiKey`]; the constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthContext {
    kind: CredentialKind,
    account_id: Uuid,
    role: Role,
    operator_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key_id: Option<Uuid>,
}

impl AuthContext {
    pub fn user(account_id: Uuid, role: Role, operator_id: Option<Uuid>) -> Self {
        Self {
            kind: CredentialKind::User,
            account_id,
            role,
            operator_id,
            api_key_id: None,
        }
    }

    pub fn api_key(
        api_key_id: Uuid,
        account_id: Uuid,
        role: Role,
        operator_id: Option<Uuid>,
    ) -> Self {
        Self {
            kind: CredentialKind::ApiKey,
            account_id,
            role,
            operator_id,
            api_key_id: Some(api_key_id),
        }
    }

    pub fn kind(&self) -> CredentialKind {
        self.kind
    }

    pub fn account_id(&self) -> Uuid {
        self.account_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn operator_id(&self) -> Option<Uuid> {
        self.operator_id
    }

    pub fn api_key_id(&self) -> Option<Uuid> {
        self.api_key_id
    }
}
