//! Account model - application-level identity records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Role;

/// Account entity, owned by the account-record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    /// Identity id issued by the external identity service.
    pub identity_id: String,
    pub email: String,
    pub role: Role,
    pub operator_id: Option<Uuid>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(identity_id: String, email: String, role: Role, operator_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity_id,
            email,
            role,
            operator_id,
            active: true,
            created_at: Utc::now(),
        }
    }

    pub fn is_operator(&self) -> bool {
        self.operator_id.is_some()
    }
}

/// Raw `accounts` row; `role` is validated when converted into [`Account`].
#[derive(Debug, Clone, FromRow)]
pub struct AccountRow {
    pub id: Uuid,
    pub identity_id: String,
    pub email: String,
    pub role: String,
    pub operator_id: Option<Uuid>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = anyhow::Error;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse()
            .map_err(|e| anyhow::anyhow!("account {} has {}", row.id, e))?;
        Ok(Self {
            id: row.id,
            identity_id: row.identity_id,
            email: row.email,
            role,
            operator_id: row.operator_id,
            active: row.active,
            created_at: row.created_at,
        })
    }
}

/// Account response for API (no identity linkage).
#[derive(Debug, Clone, Serialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub operator_id: Option<Uuid>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(a: Account) -> Self {
        Self {
            id: a.id,
            email: a.email,
            role: a.role,
            operator_id: a.operator_id,
            active: a.active,
            created_at: a.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(role: &str) -> AccountRow {
        AccountRow {
            id: Uuid::new_v4(),
            identity_id: "ident-1".to_string(),
            email: "a@b.com".to_string(),
            role: role.to_string(),
            operator_id: None,
            active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn row_with_known_role_converts() {
        let account = Account::try_from(row("admin")).unwrap();
        assert_eq!(account.role, Role::Admin);
        assert!(!account.is_operator());
    }

    #[test]
    fn row_with_unknown_role_is_rejected() {
        assert!(Account::try_from(row("owner")).is_err());
    }
}
