use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use crate::models::{Account, ApiKey, OperatorCapability};

/// Application record store: accounts, operator capabilities and API keys.
///
/// Every method is a single-row read or write; no multi-row transactions are
/// attempted from this layer.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn health_check(&self) -> Result<(), anyhow::Error>;

    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>, anyhow::Error>;
    async fn find_account_by_identity_id(
        &self,
        identity_id: &str,
    ) -> Result<Option<Account>, anyhow::Error>;
    async fn count_accounts(&self) -> Result<i64, anyhow::Error>;
    async fn insert_account(&self, account: &Account) -> Result<(), anyhow::Error>;
    /// Returns `false` when no row matched.
    async fn update_account(&self, account: &Account) -> Result<bool, anyhow::Error>;
    /// Returns `false` when no row matched.
    async fn delete_account(&self, id: Uuid) -> Result<bool, anyhow::Error>;

    async fn insert_operator(&self, operator: &OperatorCapability) -> Result<(), anyhow::Error>;
    async fn delete_operator(&self, id: Uuid) -> Result<(), anyhow::Error>;

    async fn find_api_key_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, anyhow::Error>;
    async fn insert_api_key(&self, key: &ApiKey) -> Result<(), anyhow::Error>;
    async fn touch_api_key(&self, id: Uuid, used_at: DateTime<Utc>) -> Result<(), anyhow::Error>;
}

/// In-memory store for tests, with switchable failures.
#[derive(Default)]
pub struct MockAccountStore {
    pub accounts: Mutex<HashMap<Uuid, Account>>,
    pub operators: Mutex<HashMap<Uuid, OperatorCapability>>,
    pub api_keys: Mutex<HashMap<Uuid, ApiKey>>,
    pub fail_reads: AtomicBool,
    pub fail_account_writes: AtomicBool,
    pub fail_touch: AtomicBool,
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> anyhow::Error {
    anyhow::anyhow!("Mock store mutex poisoned: {}", e)
}

impl MockAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_account_writes(&self, fail: bool) {
        self.fail_account_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_touch(&self, fail: bool) {
        self.fail_touch.store(fail, Ordering::SeqCst);
    }

    pub fn account(&self, id: Uuid) -> Option<Account> {
        self.accounts.lock().ok()?.get(&id).cloned()
    }

    pub fn api_key(&self, id: Uuid) -> Option<ApiKey> {
        self.api_keys.lock().ok()?.get(&id).cloned()
    }

    pub fn operator_exists(&self, id: Uuid) -> bool {
        self.operators
            .lock()
            .map(|ops| ops.contains_key(&id))
            .unwrap_or(false)
    }

    pub fn operator_count(&self) -> usize {
        self.operators.lock().map(|ops| ops.len()).unwrap_or(0)
    }

    /// Seed helper: stores the account as-is.
    pub fn put_account(&self, account: Account) {
        if let Ok(mut accounts) = self.accounts.lock() {
            accounts.insert(account.id, account);
        }
    }

    pub fn put_api_key(&self, key: ApiKey) {
        if let Ok(mut keys) = self.api_keys.lock() {
            keys.insert(key.id, key);
        }
    }

    pub fn put_operator(&self, operator: OperatorCapability) {
        if let Ok(mut ops) = self.operators.lock() {
            ops.insert(operator.id, operator);
        }
    }

    fn check_reads(&self) -> Result<(), anyhow::Error> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("mock store read failure"));
        }
        Ok(())
    }

    fn check_account_writes(&self) -> Result<(), anyhow::Error> {
        if self.fail_account_writes.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("mock store write failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl AccountStore for MockAccountStore {
    async fn health_check(&self) -> Result<(), anyhow::Error> {
        self.check_reads()
    }

    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>, anyhow::Error> {
        self.check_reads()?;
        Ok(self.accounts.lock().map_err(poisoned)?.get(&id).cloned())
    }

    async fn find_account_by_identity_id(
        &self,
        identity_id: &str,
    ) -> Result<Option<Account>, anyhow::Error> {
        self.check_reads()?;
        Ok(self
            .accounts
            .lock()
            .map_err(poisoned)?
            .values()
            .find(|a| a.identity_id == identity_id)
            .cloned())
    }

    async fn count_accounts(&self) -> Result<i64, anyhow::Error> {
        self.check_reads()?;
        Ok(self.accounts.lock().map_err(poisoned)?.len() as i64)
    }

    async fn insert_account(&self, account: &Account) -> Result<(), anyhow::Error> {
        self.check_account_writes()?;
        let mut accounts = self.accounts.lock().map_err(poisoned)?;
        if accounts.values().any(|a| a.email == account.email) {
            return Err(anyhow::anyhow!("duplicate email {}", account.email));
        }
        accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn update_account(&self, account: &Account) -> Result<bool, anyhow::Error> {
        self.check_account_writes()?;
        let mut accounts = self.accounts.lock().map_err(poisoned)?;
        match accounts.get_mut(&account.id) {
            Some(existing) => {
                *existing = account.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_account(&self, id: Uuid) -> Result<bool, anyhow::Error> {
        self.check_account_writes()?;
        Ok(self.accounts.lock().map_err(poisoned)?.remove(&id).is_some())
    }

    async fn insert_operator(&self, operator: &OperatorCapability) -> Result<(), anyhow::Error> {
        self.operators
            .lock()
            .map_err(poisoned)?
            .insert(operator.id, operator.clone());
        Ok(())
    }

    async fn delete_operator(&self, id: Uuid) -> Result<(), anyhow::Error> {
        self.operators.lock().map_err(poisoned)?.remove(&id);
        Ok(())
    }

    async fn find_api_key_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, anyhow::Error> {
        self.check_reads()?;
        Ok(self
            .api_keys
            .lock()
            .map_err(poisoned)?
            .values()
            .find(|k| k.key_hash == key_hash)
            .cloned())
    }

    async fn insert_api_key(&self, key: &ApiKey) -> Result<(), anyhow::Error> {
        self.api_keys
            .lock()
            .map_err(poisoned)?
            .insert(key.id, key.clone());
        Ok(())
    }

    async fn touch_api_key(&self, id: Uuid, used_at: DateTime<Utc>) -> Result<(), anyhow::Error> {
        if self.fail_touch.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("mock store touch failure"));
        }
        if let Some(key) = self.api_keys.lock().map_err(poisoned)?.get_mut(&id) {
            key.last_used_at = Some(used_at);
        }
        Ok(())
    }
}
