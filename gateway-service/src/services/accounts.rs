//! Account CRUD glue: one hook, then exactly one primary-table write.

use chrono::Utc;
use secrecy::SecretString;
use std::sync::Arc;
use uuid::Uuid;

use super::{
    AccountStore, IdentityError, IdentityLifecycle, IdentityProvider, JwtService, ServiceError,
    TokenResponse,
};
use crate::models::{
    Account, ApiKey, ApiKeyWritePayload, AuthContext, Role, UserWritePayload, WriteMode,
};

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn AccountStore>,
    identity: Arc<dyn IdentityProvider>,
    hooks: IdentityLifecycle,
    jwt: JwtService,
}

/// A freshly created key and its plaintext secret, returned to the creator once.
#[derive(Debug)]
pub struct IssuedApiKey {
    pub key: ApiKey,
    pub secret: SecretString,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn AccountStore>,
        identity: Arc<dyn IdentityProvider>,
        jwt: JwtService,
    ) -> Self {
        let hooks = IdentityLifecycle::new(store.clone(), identity.clone());
        Self {
            store,
            identity,
            hooks,
            jwt,
        }
    }

    pub fn hooks(&self) -> &IdentityLifecycle {
        &self.hooks
    }

    pub async fn health_check(&self) -> Result<(), ServiceError> {
        self.store.health_check().await.map_err(ServiceError::Store)
    }

    /// Password login through the identity service. Every failure is the
    /// same `InvalidCredential` except a disabled account.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<TokenResponse, ServiceError> {
        let email = email.trim().to_lowercase();

        let identity_id = self
            .identity
            .authenticate(&email, password)
            .await
            .map_err(|e| {
                match e {
                    IdentityError::InvalidCredentials => {
                        tracing::info!("Login rejected by identity service")
                    }
                    other => tracing::error!(error = %other, "Identity service login failed"),
                }
                ServiceError::InvalidCredential
            })?;

        let account = self
            .store
            .find_account_by_identity_id(&identity_id)
            .await
            .map_err(ServiceError::Store)?
            .ok_or(ServiceError::InvalidCredential)?;

        if !account.active {
            return Err(ServiceError::AccountDisabled);
        }

        let access_token = self
            .jwt
            .generate_access_token(account.id, account.role, account.operator_id)?;

        tracing::info!(account_id = %account.id, "Login succeeded");

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt.expiry_seconds(),
        })
    }

    /// Current account for a token-authenticated caller.
    pub async fn current_account(&self, context: &AuthContext) -> Result<Account, ServiceError> {
        let account = self
            .store
            .find_account_by_id(context.account_id())
            .await
            .map_err(ServiceError::Store)?
            .ok_or(ServiceError::InvalidCredential)?;

        if !account.active {
            return Err(ServiceError::AccountDisabled);
        }
        Ok(account)
    }

    /// One-time creation of the first superadmin. Refused once any account
    /// exists.
    #[tracing::instrument(skip(self, password))]
    pub async fn bootstrap(
        &self,
        email: &str,
        password: SecretString,
    ) -> Result<Account, ServiceError> {
        let existing = self
            .store
            .count_accounts()
            .await
            .map_err(ServiceError::Store)?;
        if existing > 0 {
            return Err(ServiceError::Conflict(
                "Bootstrap already completed".to_string(),
            ));
        }

        let account = self
            .create_user(UserWritePayload {
                email: Some(email.to_string()),
                role: Some(Role::Superadmin.to_string()),
                password: Some(password),
                ..Default::default()
            })
            .await?;

        tracing::info!(account_id = %account.id, "Bootstrap superadmin created");
        Ok(account)
    }

    /// Create hook, then one insert. A failed insert releases the identity the
    /// hook provisioned.
    #[tracing::instrument(skip(self, payload))]
    pub async fn create_user(&self, payload: UserWritePayload) -> Result<Account, ServiceError> {
        let draft = self.hooks.user_before_write(payload, WriteMode::Create).await?;

        let identity_id = draft
            .identity_id
            .ok_or_else(|| anyhow::anyhow!("Create hook returned no identity id"))?;

        let mut account = Account::new(identity_id, draft.email, draft.role, draft.operator_id);
        if let Some(active) = draft.active {
            account.active = active;
        }

        if let Err(e) = self.store.insert_account(&account).await {
            tracing::error!(error = %e, "Account insert failed, releasing identity");
            self.hooks.release_identity(&account.identity_id).await;
            return Err(ServiceError::Store(e));
        }

        tracing::info!(account_id = %account.id, role = %account.role, "Account created");
        Ok(account)
    }

    /// Update hook, then one update. Absent fields keep their stored values.
    #[tracing::instrument(skip(self, payload))]
    pub async fn update_user(
        &self,
        id: Uuid,
        payload: UserWritePayload,
    ) -> Result<Account, ServiceError> {
        let existing = self
            .store
            .find_account_by_id(id)
            .await
            .map_err(ServiceError::Store)?
            .ok_or_else(|| ServiceError::NotFound(format!("Account {} not found", id)))?;

        let merged = UserWritePayload {
            id: Some(existing.id),
            email: payload.email.or_else(|| Some(existing.email.clone())),
            role: payload.role.or_else(|| Some(existing.role.to_string())),
            identity_id: Some(existing.identity_id.clone()),
            operator_id: payload.operator_id.or(existing.operator_id),
            active: payload.active.or(Some(existing.active)),
            is_operator: payload.is_operator,
            password: None,
        };

        let draft = self.hooks.user_before_write(merged, WriteMode::Update).await?;

        let account = Account {
            id: existing.id,
            identity_id: existing.identity_id,
            email: draft.email,
            role: draft.role,
            operator_id: draft.operator_id,
            active: draft.active.unwrap_or(existing.active),
            created_at: existing.created_at,
        };

        let updated = self
            .store
            .update_account(&account)
            .await
            .map_err(ServiceError::Store)?;
        if !updated {
            return Err(ServiceError::NotFound(format!("Account {} not found", id)));
        }

        Ok(account)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_user(&self, id: Uuid) -> Result<(), ServiceError> {
        self.hooks.user_before_delete(id).await?;

        let deleted = self
            .store
            .delete_account(id)
            .await
            .map_err(ServiceError::Store)?;
        if !deleted {
            return Err(ServiceError::NotFound(format!("Account {} not found", id)));
        }

        tracing::info!(account_id = %id, "Account deleted");
        Ok(())
    }

    /// Issue an API key. Defaults to the caller's own account; issuing for
    /// another account takes admin.
    #[tracing::instrument(skip(self, caller, payload), fields(caller = %caller.account_id()))]
    pub async fn create_api_key(
        &self,
        caller: &AuthContext,
        mut payload: ApiKeyWritePayload,
    ) -> Result<IssuedApiKey, ServiceError> {
        let account_id = *payload.account_id.get_or_insert(caller.account_id());
        if account_id != caller.account_id() && !caller.role().satisfies(Role::Admin) {
            return Err(ServiceError::InsufficientRole {
                required: Role::Admin,
                actual: caller.role(),
            });
        }

        let prepared = self
            .hooks
            .api_key_before_write(payload, WriteMode::Create)
            .await?;

        let secret = prepared
            .secret
            .ok_or_else(|| anyhow::anyhow!("Create hook returned no secret"))?;
        let payload = prepared.payload;
        let role = payload
            .role
            .ok_or_else(|| anyhow::anyhow!("Create hook returned no role"))?;

        // A key never outranks the account that issued it.
        if !caller.role().satisfies(role) {
            return Err(ServiceError::InsufficientRole {
                required: role,
                actual: caller.role(),
            });
        }

        let key = ApiKey {
            id: Uuid::new_v4(),
            account_id,
            name: payload.name,
            role,
            operator_id: payload.operator_id,
            key_hash: payload
                .key_hash
                .ok_or_else(|| anyhow::anyhow!("Create hook returned no key hash"))?,
            active: payload.active.unwrap_or(true),
            created_at: Utc::now(),
            last_used_at: None,
        };

        self.store
            .insert_api_key(&key)
            .await
            .map_err(ServiceError::Store)?;

        tracing::info!(api_key_id = %key.id, account_id = %account_id, "API key issued");
        Ok(IssuedApiKey { key, secret })
    }
}
