//! Best-effort API key usage auditing.

use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::AccountStore;

/// Records `last_used_at` on API keys off the request path. Failures are
/// logged and never reach the caller.
#[derive(Clone)]
pub struct ApiKeyAuditor {
    store: Arc<dyn AccountStore>,
}

impl ApiKeyAuditor {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    /// Dispatch the update on a detached task. The handle is returned for
    /// tests; request code drops it.
    pub fn record_use(&self, api_key_id: Uuid) -> JoinHandle<()> {
        let store = self.store.clone();
        let used_at = Utc::now();
        tokio::spawn(async move {
            if let Err(e) = store.touch_api_key(api_key_id, used_at).await {
                tracing::warn!(
                    api_key_id = %api_key_id,
                    error = %e,
                    "Failed to record API key usage"
                );
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ApiKey, Role};
    use crate::services::MockAccountStore;

    fn key() -> ApiKey {
        ApiKey {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            name: None,
            role: Role::User,
            operator_id: None,
            key_hash: ApiKey::calculate_key_hash("secret"),
            active: true,
            created_at: Utc::now(),
            last_used_at: None,
        }
    }

    #[tokio::test]
    async fn records_last_used_timestamp() {
        let store = Arc::new(MockAccountStore::new());
        let key = key();
        store.put_api_key(key.clone());

        ApiKeyAuditor::new(store.clone())
            .record_use(key.id)
            .await
            .unwrap();

        assert!(store.api_key(key.id).unwrap().last_used_at.is_some());
    }

    #[tokio::test]
    async fn swallows_store_failures() {
        let store = Arc::new(MockAccountStore::new());
        store.set_fail_touch(true);
        let key = key();
        store.put_api_key(key.clone());

        let result = ApiKeyAuditor::new(store.clone()).record_use(key.id).await;

        assert!(result.is_ok());
        assert!(store.api_key(key.id).unwrap().last_used_at.is_none());
    }
}
