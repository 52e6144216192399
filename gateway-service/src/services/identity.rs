//! External identity service: the source of truth for identity ids and
//! password verification.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::config::IdentityServiceConfig;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity provisioning failed: {0}")]
    Provision(String),

    #[error("identity deletion failed: {0}")]
    Delete(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("identity service unreachable: {0}")]
    Transport(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Provision a confirmed identity keyed by `email`; returns its id.
    async fn create_identity(
        &self,
        email: &str,
        password: Option<&SecretString>,
    ) -> Result<String, IdentityError>;

    /// Used to compensate a failed account creation.
    async fn delete_identity(&self, identity_id: &str) -> Result<(), IdentityError>;

    /// Password check for the login handler; returns the identity id.
    async fn authenticate(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<String, IdentityError>;
}

/// REST client for the identity service admin API.
#[derive(Clone)]
pub struct IdentityServiceClient {
    http: reqwest::Client,
    base_url: String,
    service_key: SecretString,
}

#[derive(Serialize)]
struct CreateIdentityRequest<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
    email_confirm: bool,
}

#[derive(Serialize)]
struct PasswordGrantRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct IdentityResponse {
    id: String,
}

#[derive(Deserialize)]
struct PasswordGrantResponse {
    user: IdentityResponse,
}

impl IdentityServiceClient {
    pub fn new(config: &IdentityServiceConfig) -> Result<Self, anyhow::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build identity service client: {}", e))?;

        tracing::info!(base_url = %config.base_url, "Identity service client configured");

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            service_key: config.service_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl IdentityProvider for IdentityServiceClient {
    async fn create_identity(
        &self,
        email: &str,
        password: Option<&SecretString>,
    ) -> Result<String, IdentityError> {
        let response = self
            .http
            .post(self.url("/admin/users"))
            .bearer_auth(self.service_key.expose_secret())
            .json(&CreateIdentityRequest {
                email,
                password: password.map(|p| p.expose_secret().as_str()),
                email_confirm: true,
            })
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(%status, error = %error_text, "Identity provisioning rejected");
            return Err(IdentityError::Provision(format!("status {}", status)));
        }

        let identity = response
            .json::<IdentityResponse>()
            .await
            .map_err(|e| IdentityError::Provision(format!("malformed response: {}", e)))?;

        Ok(identity.id)
    }

    async fn delete_identity(&self, identity_id: &str) -> Result<(), IdentityError> {
        let response = self
            .http
            .delete(self.url(&format!("/admin/users/{}", identity_id)))
            .bearer_auth(self.service_key.expose_secret())
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IdentityError::Delete(format!("status {}", response.status())));
        }
        Ok(())
    }

    async fn authenticate(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<String, IdentityError> {
        let response = self
            .http
            .post(self.url("/token"))
            .query(&[("grant_type", "password")])
            .header("apikey", self.service_key.expose_secret())
            .json(&PasswordGrantRequest {
                email,
                password: password.expose_secret(),
            })
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        if let Some(err) = password_grant_error(response.status()) {
            return Err(err);
        }

        let grant = response
            .json::<PasswordGrantResponse>()
            .await
            .map_err(|e| IdentityError::Transport(format!("malformed response: {}", e)))?;

        Ok(grant.user.id)
    }
}

/// Only a 400 means the email/password pair was refused. 401 and 403 mean
/// the service key itself was rejected.
fn password_grant_error(status: reqwest::StatusCode) -> Option<IdentityError> {
    match status {
        s if s.is_success() => None,
        reqwest::StatusCode::BAD_REQUEST => Some(IdentityError::InvalidCredentials),
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => Some(
            IdentityError::Transport(format!("service key rejected: status {}", status)),
        ),
        s => Some(IdentityError::Transport(format!("status {}", s))),
    }
}

struct MockIdentity {
    email: String,
    password: Option<String>,
}

/// In-memory identity service for tests.
#[derive(Default)]
pub struct MockIdentityProvider {
    identities: Mutex<HashMap<String, MockIdentity>>,
    pub fail_create: AtomicBool,
    pub fail_delete: AtomicBool,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    pub fn identity_count(&self) -> usize {
        self.identities.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn has_identity(&self, identity_id: &str) -> bool {
        self.identities
            .lock()
            .map(|m| m.contains_key(identity_id))
            .unwrap_or(false)
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> IdentityError {
    IdentityError::Transport(format!("Mock identity mutex poisoned: {}", e))
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn create_identity(
        &self,
        email: &str,
        password: Option<&SecretString>,
    ) -> Result<String, IdentityError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(IdentityError::Provision("mock provisioning failure".into()));
        }
        let mut identities = self.identities.lock().map_err(poisoned)?;
        if identities.values().any(|i| i.email == email) {
            return Err(IdentityError::Provision(format!("{} already registered", email)));
        }
        let id = Uuid::new_v4().to_string();
        identities.insert(
            id.clone(),
            MockIdentity {
                email: email.to_string(),
                password: password.map(|p| p.expose_secret().clone()),
            },
        );
        Ok(id)
    }

    async fn delete_identity(&self, identity_id: &str) -> Result<(), IdentityError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(IdentityError::Delete("mock deletion failure".into()));
        }
        self.identities.lock().map_err(poisoned)?.remove(identity_id);
        Ok(())
    }

    async fn authenticate(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<String, IdentityError> {
        let identities = self.identities.lock().map_err(poisoned)?;
        identities
            .iter()
            .find(|(_, i)| {
                i.email == email && i.password.as_deref() == Some(password.expose_secret().as_str())
            })
            .map(|(id, _)| id.clone())
            .ok_or(IdentityError::InvalidCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_provisions_and_authenticates() {
        let idp = MockIdentityProvider::new();
        let password = SecretString::new("hunter2hunter2".to_string());

        let id = idp.create_identity("a@b.com", Some(&password)).await.unwrap();
        assert!(idp.has_identity(&id));
        assert_eq!(idp.authenticate("a@b.com", &password).await.unwrap(), id);

        let wrong = SecretString::new("nope".to_string());
        assert!(matches!(
            idp.authenticate("a@b.com", &wrong).await,
            Err(IdentityError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn mock_rejects_duplicate_email() {
        let idp = MockIdentityProvider::new();
        idp.create_identity("a@b.com", None).await.unwrap();
        assert!(matches!(
            idp.create_identity("a@b.com", None).await,
            Err(IdentityError::Provision(_))
        ));
    }

    #[test]
    fn only_bad_request_counts_as_wrong_password() {
        use reqwest::StatusCode;

        assert!(password_grant_error(StatusCode::OK).is_none());
        assert!(matches!(
            password_grant_error(StatusCode::BAD_REQUEST),
            Some(IdentityError::InvalidCredentials)
        ));
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            assert!(matches!(
                password_grant_error(status),
                Some(IdentityError::Transport(_))
            ));
        }
        assert!(matches!(
            password_grant_error(StatusCode::BAD_GATEWAY),
            Some(IdentityError::Transport(_))
        ));
    }
}
