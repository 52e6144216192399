//! PostgreSQL implementation of the account-record store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use uuid::Uuid;

use super::AccountStore;
use crate::models::{Account, AccountRow, ApiKey, ApiKeyRow, OperatorCapability};

/// PostgreSQL database wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn db_err(e: sqlx::Error) -> anyhow::Error {
    anyhow::anyhow!("Database error: {}", e)
}

#[async_trait]
impl AccountStore for Database {
    async fn health_check(&self) -> Result<(), anyhow::Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    // ==================== Account Operations ====================

    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>, anyhow::Error> {
        sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(Account::try_from)
            .transpose()
    }

    async fn find_account_by_identity_id(
        &self,
        identity_id: &str,
    ) -> Result<Option<Account>, anyhow::Error> {
        sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE identity_id = $1")
            .bind(identity_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(Account::try_from)
            .transpose()
    }

    async fn count_accounts(&self) -> Result<i64, anyhow::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(count)
    }

    async fn insert_account(&self, account: &Account) -> Result<(), anyhow::Error> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, identity_id, email, role, operator_id, active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(account.id)
        .bind(&account.identity_id)
        .bind(&account.email)
        .bind(account.role.as_str())
        .bind(account.operator_id)
        .bind(account.active)
        .bind(account.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn update_account(&self, account: &Account) -> Result<bool, anyhow::Error> {
        let result = sqlx::query(
            r#"
            UPDATE accounts SET email = $2, role = $3, operator_id = $4, active = $5
            WHERE id = $1
            "#,
        )
        .bind(account.id)
        .bind(&account.email)
        .bind(account.role.as_str())
        .bind(account.operator_id)
        .bind(account.active)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_account(&self, id: Uuid) -> Result<bool, anyhow::Error> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    // ==================== Operator Operations ====================

    async fn insert_operator(&self, operator: &OperatorCapability) -> Result<(), anyhow::Error> {
        sqlx::query(
            "INSERT INTO operators (id, name, status, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(operator.id)
        .bind(&operator.name)
        .bind(&operator.status)
        .bind(operator.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn delete_operator(&self, id: Uuid) -> Result<(), anyhow::Error> {
        sqlx::query("DELETE FROM operators WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    // ==================== API Key Operations ====================

    async fn find_api_key_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, anyhow::Error> {
        sqlx::query_as::<_, ApiKeyRow>("SELECT * FROM api_keys WHERE key_hash = $1")
            .bind(key_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(ApiKey::try_from)
            .transpose()
    }

    async fn insert_api_key(&self, key: &ApiKey) -> Result<(), anyhow::Error> {
        sqlx::query(
            r#"
            INSERT INTO api_keys (id, account_id, name, role, operator_id, key_hash, active, created_at, last_used_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(key.id)
        .bind(key.account_id)
        .bind(&key.name)
        .bind(key.role.as_str())
        .bind(key.operator_id)
        .bind(&key.key_hash)
        .bind(key.active)
        .bind(key.created_at)
        .bind(key.last_used_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn touch_api_key(&self, id: Uuid, used_at: DateTime<Utc>) -> Result<(), anyhow::Error> {
        sqlx::query("UPDATE api_keys SET last_used_at = $2 WHERE id = $1")
            .bind(id)
            .bind(used_at)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
