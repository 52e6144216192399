//! Shared harness for gateway integration tests.
//!
//! Builds the full router over in-memory collaborators, so no PostgreSQL or
//! identity service is needed.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use gateway_service::{
    build_router,
    config::{
        DatabaseConfig, Environment, GatewayConfig, IdentityServiceConfig, JwtConfig,
        SecurityConfig,
    },
    models::{Account, ApiKey, Role},
    services::{JwtService, MockAccountStore, MockIdentityProvider},
    AppState,
};
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "integration-test-signing-secret-0123456789";
pub const API_KEY_HEADER: &str = "x-api-key";

pub fn test_config() -> GatewayConfig {
    GatewayConfig {
        common: service_core::config::Config::default(),
        environment: Environment::Dev,
        service_name: "gateway-service".to_string(),
        service_version: "test".to_string(),
        log_level: "error".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 0,
        },
        jwt: JwtConfig {
            secret: SecretString::new(TEST_JWT_SECRET.to_string()),
            expiry_minutes: 15,
        },
        identity: IdentityServiceConfig {
            base_url: "http://identity.invalid".to_string(),
            service_key: SecretString::new("unused".to_string()),
            timeout_seconds: 1,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            api_key_header: API_KEY_HEADER.to_string(),
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MockAccountStore>,
    pub identity: Arc<MockIdentityProvider>,
    pub jwt: JwtService,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestApp {
    pub fn spawn() -> Self {
        let config = test_config();
        let store = Arc::new(MockAccountStore::new());
        let identity = Arc::new(MockIdentityProvider::new());
        let jwt = JwtService::new(&config.jwt);

        let state = AppState::new(config, store.clone(), identity.clone())
            .expect("Failed to build app state");

        Self {
            router: build_router(state),
            store,
            identity,
            jwt,
        }
    }

    pub fn seed_account(&self, role: Role, operator_id: Option<Uuid>, active: bool) -> Account {
        let mut account = Account::new(
            format!("identity-{}", Uuid::new_v4()),
            format!("{}@example.com", Uuid::new_v4()),
            role,
            operator_id,
        );
        account.active = active;
        self.store.put_account(account.clone());
        account
    }

    /// Token whose claims mirror the account as it is now.
    pub fn token_for(&self, account: &Account) -> String {
        self.jwt
            .generate_access_token(account.id, account.role, account.operator_id)
            .expect("Failed to sign token")
    }

    /// Store a key record directly; returns it with its plaintext secret.
    pub fn seed_api_key(
        &self,
        account_id: Uuid,
        role: Role,
        operator_id: Option<Uuid>,
        active: bool,
    ) -> (ApiKey, String) {
        let secret = format!("test-secret-{}", Uuid::new_v4());
        let key = ApiKey {
            id: Uuid::new_v4(),
            account_id,
            name: Some("test".to_string()),
            role,
            operator_id,
            key_hash: ApiKey::calculate_key_hash(&secret),
            active,
            created_at: Utc::now(),
            last_used_at: None,
        };
        self.store.put_api_key(key.clone());
        (key, secret)
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        headers: &[(&str, &str)],
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }

    pub async fn get(&self, uri: &str, headers: &[(&str, &str)]) -> TestResponse {
        self.request(Method::GET, uri, headers, None).await
    }

    pub async fn post(&self, uri: &str, headers: &[(&str, &str)], body: Value) -> TestResponse {
        self.request(Method::POST, uri, headers, Some(body)).await
    }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
