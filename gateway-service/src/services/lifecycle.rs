//! Identity lifecycle hooks.
//!
//! Each hook runs immediately before the CRUD layer's single write to the
//! primary table. Hooks only transform the in-flight payload and write to
//! *other* entities: the external identity service and operator capability
//! records. At most one identity write and one capability write per call.

use std::sync::Arc;
use uuid::Uuid;

use super::{AccountStore, IdentityProvider, ServiceError};
use crate::models::{
    AccountDraft, ApiKey, ApiKeyWritePayload, OperatorCapability, PreparedApiKey, Role,
    UserWritePayload, WriteMode,
};

#[derive(Clone)]
pub struct IdentityLifecycle {
    store: Arc<dyn AccountStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl IdentityLifecycle {
    pub fn new(store: Arc<dyn AccountStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { store, identity }
    }

    /// User before-write. Returns the draft the CRUD layer persists.
    #[tracing::instrument(skip(self, payload))]
    pub async fn user_before_write(
        &self,
        payload: UserWritePayload,
        mode: WriteMode,
    ) -> Result<AccountDraft, ServiceError> {
        let email = payload
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| ServiceError::validation("Email is required"))?
            .to_lowercase();

        let role: Role = payload
            .role
            .as_deref()
            .ok_or_else(|| ServiceError::validation("Role is required"))?
            .parse()
            .map_err(|e: crate::models::InvalidRole| ServiceError::validation(e.to_string()))?;

        let (id, identity_id) = match mode {
            WriteMode::Create => {
                let identity_id = self
                    .identity
                    .create_identity(&email, payload.password.as_ref())
                    .await
                    .map_err(|e| ServiceError::Provision(anyhow::anyhow!(e)))?;
                tracing::info!(identity_id = %identity_id, "Provisioned external identity");
                // Inbound ids are never trusted on create.
                (None, Some(identity_id))
            }
            WriteMode::Update => (payload.id, payload.identity_id),
        };

        let operator_id = match payload.operator_id {
            Some(existing) => Some(existing),
            None if payload.is_operator => {
                match self.provision_operator(&email).await {
                    Ok(operator_id) => Some(operator_id),
                    Err(e) => {
                        if let (WriteMode::Create, Some(identity_id)) = (mode, identity_id.as_deref()) {
                            self.release_identity(identity_id).await;
                        }
                        return Err(e);
                    }
                }
            }
            None => None,
        };

        Ok(AccountDraft {
            id,
            email,
            role,
            identity_id,
            operator_id,
            active: payload.active,
        })
    }

    /// User before-delete. Removes the account's operator capability, if any.
    /// A failed lookup aborts the delete.
    #[tracing::instrument(skip(self))]
    pub async fn user_before_delete(&self, account_id: Uuid) -> Result<(), ServiceError> {
        let account = self
            .store
            .find_account_by_id(account_id)
            .await
            .map_err(ServiceError::Store)?
            .ok_or_else(|| ServiceError::NotFound(format!("Account {} not found", account_id)))?;

        if let Some(operator_id) = account.operator_id {
            self.store
                .delete_operator(operator_id)
                .await
                .map_err(ServiceError::Store)?;
            tracing::info!(operator_id = %operator_id, "Removed operator capability");
        }

        Ok(())
    }

    /// API key before-write. Update mode passes the payload through.
    #[tracing::instrument(skip(self, payload))]
    pub async fn api_key_before_write(
        &self,
        mut payload: ApiKeyWritePayload,
        mode: WriteMode,
    ) -> Result<PreparedApiKey, ServiceError> {
        if mode == WriteMode::Update {
            return Ok(PreparedApiKey {
                payload,
                secret: None,
            });
        }

        let secret = ApiKey::generate_secret();
        payload.key_hash = Some(ApiKey::hash_secret(&secret));
        payload.active = Some(true);

        if let Some(account_id) = payload.account_id {
            let account = self
                .store
                .find_account_by_id(account_id)
                .await
                .map_err(ServiceError::Store)?
                .ok_or_else(|| ServiceError::validation("Owning account does not exist"))?;
            payload.role = Some(account.role);
            payload.operator_id = account.operator_id;
        }

        Ok(PreparedApiKey {
            payload,
            secret: Some(secret),
        })
    }

    async fn provision_operator(&self, email: &str) -> Result<Uuid, ServiceError> {
        let operator = OperatorCapability::new(email.to_string());
        self.store
            .insert_operator(&operator)
            .await
            .map_err(ServiceError::Store)?;
        tracing::info!(operator_id = %operator.id, "Created operator capability");
        Ok(operator.id)
    }

    /// Best-effort removal of an identity provisioned earlier in a write that
    /// did not complete.
    pub(crate) async fn release_identity(&self, identity_id: &str) {
        if let Err(e) = self.identity.delete_identity(identity_id).await {
            tracing::error!(
                identity_id = %identity_id,
                error = %e,
                "Failed to remove orphaned external identity"
            );
        }
    }
}
