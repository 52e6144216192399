//! Credential verifier: bearer tokens and API key secrets.
//!
//! The two kinds have different trust roots. A token is self-certifying
//! (signature + expiry); an API key is a bare secret that only means something
//! once its digest is found in the store.

use axum::http::{header, HeaderMap, HeaderName};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use super::{AccessTokenClaims, AccountStore, JwtService, ServiceError};
use crate::models::ApiKey;

pub const DEFAULT_API_KEY_HEADER: &str = "x-api-key";

/// The single credential a request presented.
#[derive(Debug)]
pub enum PresentedCredential {
    Bearer(String),
    ApiKey(SecretString),
}

/// Raw claims produced by a successful verification.
#[derive(Debug, Clone)]
pub enum VerifiedClaims {
    Token(AccessTokenClaims),
    ApiKey(ApiKey),
}

/// Raw bytes after `Bearer ` in the Authorization header, if that scheme is
/// used. Presence is decided on bytes so a non-UTF-8 token still counts.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&[u8]> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.as_bytes().strip_prefix(b"Bearer "))
}

#[derive(Clone)]
pub struct CredentialVerifier {
    jwt: JwtService,
    store: Arc<dyn AccountStore>,
    api_key_header: HeaderName,
}

impl CredentialVerifier {
    pub fn new(jwt: JwtService, store: Arc<dyn AccountStore>, api_key_header: HeaderName) -> Self {
        Self {
            jwt,
            store,
            api_key_header,
        }
    }

    pub fn api_key_header(&self) -> &HeaderName {
        &self.api_key_header
    }

    /// Pick the presented credential. Presenting both is rejected before
    /// either is looked at.
    pub fn extract(&self, headers: &HeaderMap) -> Result<PresentedCredential, ServiceError> {
        let bearer = bearer_token(headers);
        let api_key = headers.get(&self.api_key_header);

        match (bearer, api_key) {
            (Some(_), Some(_)) => Err(ServiceError::AmbiguousCredential),
            (Some(raw), None) => {
                let token = std::str::from_utf8(raw).map_err(|_| ServiceError::InvalidCredential)?;
                Ok(PresentedCredential::Bearer(token.trim().to_string()))
            }
            (None, Some(value)) => {
                let secret = value
                    .to_str()
                    .map_err(|_| ServiceError::InvalidCredential)?;
                Ok(PresentedCredential::ApiKey(SecretString::new(secret.to_string())))
            }
            (None, None) => Err(ServiceError::AuthenticationRequired),
        }
    }

    pub async fn verify(
        &self,
        credential: PresentedCredential,
    ) -> Result<VerifiedClaims, ServiceError> {
        match credential {
            PresentedCredential::Bearer(token) => self.verify_token(&token).map(VerifiedClaims::Token),
            PresentedCredential::ApiKey(secret) => {
                self.verify_api_key(&secret).await.map(VerifiedClaims::ApiKey)
            }
        }
    }

    pub async fn verify_headers(&self, headers: &HeaderMap) -> Result<VerifiedClaims, ServiceError> {
        let credential = self.extract(headers)?;
        self.verify(credential).await
    }

    /// Signature and expiry only. Every failure is the same `InvalidCredential`.
    pub fn verify_token(&self, token: &str) -> Result<AccessTokenClaims, ServiceError> {
        self.jwt.validate_access_token(token).map_err(|e| {
            tracing::debug!(error = %e, "Bearer token rejected");
            ServiceError::InvalidCredential
        })
    }

    async fn verify_api_key(&self, secret: &SecretString) -> Result<ApiKey, ServiceError> {
        let key_hash = ApiKey::calculate_key_hash(secret.expose_secret());

        let record = self
            .store
            .find_api_key_by_hash(&key_hash)
            .await
            .map_err(ServiceError::Store)?;

        match record {
            Some(key)
                if key.active && bool::from(key.key_hash.as_bytes().ct_eq(key_hash.as_bytes())) =>
            {
                Ok(key)
            }
            Some(key) => {
                tracing::debug!(api_key_id = %key.id, "Inactive API key presented");
                Err(ServiceError::InvalidCredential)
            }
            None => Err(ServiceError::InvalidCredential),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use crate::models::Role;
    use crate::services::MockAccountStore;
    use axum::http::HeaderValue;
    use chrono::Utc;
    use uuid::Uuid;

    const SECRET: &str = "credential-tests-secret-0123456789";

    fn verifier(store: Arc<MockAccountStore>) -> CredentialVerifier {
        let jwt = JwtService::new(&JwtConfig {
            secret: SecretString::new(SECRET.to_string()),
            expiry_minutes: 5,
        });
        CredentialVerifier::new(jwt, store, HeaderName::from_static(DEFAULT_API_KEY_HEADER))
    }

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    fn stored_key(store: &MockAccountStore, secret: &str, active: bool) -> ApiKey {
        let key = ApiKey {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            name: Some("ci".to_string()),
            role: Role::Admin,
            operator_id: None,
            key_hash: ApiKey::calculate_key_hash(secret),
            active,
            created_at: Utc::now(),
            last_used_at: None,
        };
        store.put_api_key(key.clone());
        key
    }

    #[test]
    fn both_credentials_are_ambiguous() {
        let v = verifier(Arc::new(MockAccountStore::new()));
        let result = v.extract(&headers(&[
            ("authorization", "Bearer whatever"),
            ("x-api-key", "whatever"),
        ]));
        assert!(matches!(result, Err(ServiceError::AmbiguousCredential)));
    }

    #[test]
    fn no_credential_requires_authentication() {
        let v = verifier(Arc::new(MockAccountStore::new()));
        assert!(matches!(
            v.extract(&HeaderMap::new()),
            Err(ServiceError::AuthenticationRequired)
        ));
        // A non-bearer Authorization scheme does not count as a token.
        assert!(matches!(
            v.extract(&headers(&[("authorization", "Basic Zm9vOmJhcg==")])),
            Err(ServiceError::AuthenticationRequired)
        ));
    }

    #[tokio::test]
    async fn non_utf8_bearer_still_conflicts_with_api_key() {
        let store = Arc::new(MockAccountStore::new());
        stored_key(&store, "plain-secret", true);
        let v = verifier(store);

        let mut map = headers(&[("x-api-key", "plain-secret")]);
        map.insert(
            header::AUTHORIZATION,
            HeaderValue::from_bytes(b"Bearer \xfftok").unwrap(),
        );
        assert!(matches!(
            v.verify_headers(&map).await,
            Err(ServiceError::AmbiguousCredential)
        ));

        map.remove("x-api-key");
        assert!(matches!(
            v.extract(&map),
            Err(ServiceError::InvalidCredential)
        ));
    }

    #[tokio::test]
    async fn valid_api_key_yields_record() {
        let store = Arc::new(MockAccountStore::new());
        let key = stored_key(&store, "plain-secret", true);
        let v = verifier(store);

        match v.verify_headers(&headers(&[("x-api-key", "plain-secret")])).await {
            Ok(VerifiedClaims::ApiKey(found)) => assert_eq!(found.id, key.id),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn unknown_and_inactive_keys_fail_identically() {
        let store = Arc::new(MockAccountStore::new());
        stored_key(&store, "disabled-secret", false);
        let v = verifier(store);

        let unknown = v.verify_headers(&headers(&[("x-api-key", "nope")])).await;
        let inactive = v
            .verify_headers(&headers(&[("x-api-key", "disabled-secret")]))
            .await;

        assert!(matches!(unknown, Err(ServiceError::InvalidCredential)));
        assert!(matches!(inactive, Err(ServiceError::InvalidCredential)));
    }

    #[tokio::test]
    async fn store_failure_on_key_lookup_is_a_store_error() {
        let store = Arc::new(MockAccountStore::new());
        store.set_fail_reads(true);
        let v = verifier(store);

        let result = v.verify_headers(&headers(&[("x-api-key", "anything")])).await;
        assert!(matches!(result, Err(ServiceError::Store(_))));
    }

    #[test]
    fn garbage_token_is_invalid_credential() {
        let v = verifier(Arc::new(MockAccountStore::new()));
        assert!(matches!(
            v.verify_token("garbage"),
            Err(ServiceError::InvalidCredential)
        ));
    }
}
