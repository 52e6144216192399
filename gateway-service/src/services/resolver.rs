//! Turns verified claims into an authorized [`AuthContext`].

use std::sync::Arc;

use super::{AccountStore, ApiKeyAuditor, ServiceError, VerifiedClaims};
use crate::models::{AuthContext, Role};

/// What a route asks of its caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthRequirement {
    pub minimum_role: Option<Role>,
    pub require_operator: bool,
}

impl AuthRequirement {
    /// Any authenticated caller.
    pub const fn any() -> Self {
        Self {
            minimum_role: None,
            require_operator: false,
        }
    }

    pub const fn role(minimum: Role) -> Self {
        Self {
            minimum_role: Some(minimum),
            require_operator: false,
        }
    }

    pub const fn operator() -> Self {
        Self {
            minimum_role: None,
            require_operator: true,
        }
    }

    pub const fn with_operator(mut self) -> Self {
        self.require_operator = true;
        self
    }
}

#[derive(Clone)]
pub struct AuthContextResolver {
    store: Arc<dyn AccountStore>,
    auditor: ApiKeyAuditor,
}

impl AuthContextResolver {
    pub fn new(store: Arc<dyn AccountStore>, auditor: ApiKeyAuditor) -> Self {
        Self { store, auditor }
    }

    /// Checks run in a fixed order: disabled, role, operator. The first
    /// failure wins and nothing after it is evaluated.
    pub async fn resolve(
        &self,
        claims: VerifiedClaims,
        requirement: &AuthRequirement,
    ) -> Result<AuthContext, ServiceError> {
        match claims {
            VerifiedClaims::Token(claims) => {
                let account = self
                    .store
                    .find_account_by_id(claims.user_id)
                    .await
                    .map_err(ServiceError::Store)?;

                let Some(account) = account else {
                    // Tokens for accounts the store does not know keep their
                    // claimed role but never carry operator capability.
                    tracing::debug!(
                        account_id = %claims.user_id,
                        "Token subject not found in store, using claims"
                    );
                    return Ok(AuthContext::user(claims.user_id, claims.role, None));
                };

                check(account.active, account.role, account.operator_id, requirement)?;
                Ok(AuthContext::user(account.id, account.role, account.operator_id))
            }
            VerifiedClaims::ApiKey(key) => {
                check(key.active, key.role, key.operator_id, requirement)?;

                let context =
                    AuthContext::api_key(key.id, key.account_id, key.role, key.operator_id);
                // Not awaited: the request proceeds whether or not this lands.
                let _ = self.auditor.record_use(key.id);
                Ok(context)
            }
        }
    }
}

fn check(
    active: bool,
    role: Role,
    operator_id: Option<uuid::Uuid>,
    requirement: &AuthRequirement,
) -> Result<(), ServiceError> {
    if !active {
        return Err(ServiceError::AccountDisabled);
    }

    if let Some(required) = requirement.minimum_role {
        if !role.satisfies(required) {
            return Err(ServiceError::InsufficientRole {
                required,
                actual: role,
            });
        }
    }

    if requirement.require_operator && operator_id.is_none() {
        return Err(ServiceError::OperatorCapabilityRequired);
    }

    Ok(())
}
