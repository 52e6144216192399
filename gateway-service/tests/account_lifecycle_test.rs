//! Account and API key lifecycle through the HTTP surface.

mod common;

use axum::http::{Method, StatusCode};
use common::{bearer, TestApp, API_KEY_HEADER};
use gateway_service::models::{ApiKey, Role};
use serde_json::json;
use uuid::Uuid;

const PASSWORD: &str = "correct-horse-battery";

async fn bootstrap_and_login(app: &TestApp) -> String {
    let created = app
        .post(
            "/users/bootstrap",
            &[],
            json!({"email": "Root@Example.com", "password": PASSWORD}),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);

    let login = app
        .post(
            "/auth/login",
            &[],
            json!({"email": "root@example.com", "password": PASSWORD}),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    login.body["access_token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn bootstrap_is_one_time() {
    let app = TestApp::spawn();

    let first = app
        .post(
            "/users/bootstrap",
            &[],
            json!({"email": "root@example.com", "password": PASSWORD}),
        )
        .await;
    assert_eq!(first.status, StatusCode::CREATED);
    assert_eq!(first.body["role"], "superadmin");

    let second = app
        .post(
            "/users/bootstrap",
            &[],
            json!({"email": "again@example.com", "password": PASSWORD}),
        )
        .await;
    assert_eq!(second.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let app = TestApp::spawn();
    bootstrap_and_login(&app).await;

    let response = app
        .post(
            "/auth/login",
            &[],
            json!({"email": "root@example.com", "password": "wrong-password"}),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_returns_account_for_token() {
    let app = TestApp::spawn();
    let token = bootstrap_and_login(&app).await;
    let auth = bearer(&token);

    let response = app.get("/auth/me", &[("authorization", auth.as_str())]).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["account"]["email"], "root@example.com");
    assert_eq!(response.body["auth"]["kind"], "user");
}

#[tokio::test]
async fn me_does_not_accept_api_keys() {
    let app = TestApp::spawn();
    let owner = app.seed_account(Role::Admin, None, true);
    let (_, secret) = app.seed_api_key(owner.id, Role::Admin, None, true);

    let response = app.get("/auth/me", &[(API_KEY_HEADER, secret.as_str())]).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_user_normalizes_and_provisions_operator() {
    let app = TestApp::spawn();
    let auth = bearer(&bootstrap_and_login(&app).await);
    let spoofed = Uuid::new_v4();

    let response = app
        .post(
            "/users",
            &[("authorization", auth.as_str())],
            json!({
                "id": spoofed,
                "email": "A@B.com",
                "role": "user",
                "is_operator": true,
                "password": "temporary-pass"
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["email"], "a@b.com");
    assert_ne!(response.body["id"], spoofed.to_string());
    assert!(response.body.get("is_operator").is_none());
    assert!(response.body.get("password").is_none());

    let operator_id: Uuid = response.body["operator_id"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(app.store.operator_exists(operator_id));
    assert_eq!(app.identity.identity_count(), 2);
}

#[tokio::test]
async fn create_user_with_unknown_role_is_unprocessable() {
    let app = TestApp::spawn();
    let auth = bearer(&bootstrap_and_login(&app).await);

    let response = app
        .post(
            "/users",
            &[("authorization", auth.as_str())],
            json!({"email": "x@example.com", "role": "owner"}),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(app.identity.identity_count(), 1);
}

#[tokio::test]
async fn provisioning_failure_aborts_create() {
    let app = TestApp::spawn();
    let auth = bearer(&bootstrap_and_login(&app).await);
    app.identity.set_fail_create(true);

    let response = app
        .post(
            "/users",
            &[("authorization", auth.as_str())],
            json!({"email": "x@example.com", "role": "user", "is_operator": true}),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert_eq!(app.store.operator_count(), 0);
}

#[tokio::test]
async fn delete_user_removes_operator_capability() {
    let app = TestApp::spawn();
    let auth = bearer(&bootstrap_and_login(&app).await);

    let created = app
        .post(
            "/users",
            &[("authorization", auth.as_str())],
            json!({"email": "ops@example.com", "role": "user", "is_operator": true}),
        )
        .await;
    let id = created.body["id"].as_str().unwrap().to_string();
    let operator_id: Uuid = created.body["operator_id"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();

    let deleted = app
        .request(
            Method::DELETE,
            &format!("/users/{}", id),
            &[("authorization", auth.as_str())],
            None,
        )
        .await;

    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert!(!app.store.operator_exists(operator_id));
}

#[tokio::test]
async fn api_key_keeps_grants_after_owner_is_demoted() {
    let app = TestApp::spawn();
    let operator_id = Uuid::new_v4();
    let owner = app.seed_account(Role::Admin, Some(operator_id), true);
    let auth = bearer(&app.token_for(&owner));

    let created = app
        .post(
            "/api-keys",
            &[("authorization", auth.as_str())],
            json!({"name": "deploy"}),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["role"], "admin");
    assert_eq!(created.body["operator_id"], operator_id.to_string());
    assert!(created.body.get("key_hash").is_none());

    let secret = created.body["key"].as_str().unwrap().to_string();
    let key_id: Uuid = created.body["id"].as_str().unwrap().parse().unwrap();
    assert_eq!(
        app.store.api_key(key_id).unwrap().key_hash,
        ApiKey::calculate_key_hash(&secret)
    );

    let mut demoted = owner.clone();
    demoted.role = Role::Viewer;
    app.store.put_account(demoted);

    // The key still carries admin: it can create users.
    let response = app
        .post(
            "/users",
            &[(API_KEY_HEADER, secret.as_str())],
            json!({"email": "via-key@example.com", "role": "viewer"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
}

#[tokio::test]
async fn admin_cannot_issue_superadmin_key() {
    let app = TestApp::spawn();
    let admin = app.seed_account(Role::Admin, None, true);
    let root = app.seed_account(Role::Superadmin, None, true);
    let auth = bearer(&app.token_for(&admin));

    let response = app
        .post(
            "/api-keys",
            &[("authorization", auth.as_str())],
            json!({"name": "escalate", "account_id": root.id}),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert!(app.store.api_keys.lock().unwrap().is_empty());
}

#[tokio::test]
async fn update_user_changes_role() {
    let app = TestApp::spawn();
    let auth = bearer(&bootstrap_and_login(&app).await);
    let target = app.seed_account(Role::User, None, true);

    let response = app
        .request(
            Method::PATCH,
            &format!("/users/{}", target.id),
            &[("authorization", auth.as_str())],
            Some(json!({"role": "viewer"})),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["role"], "viewer");
    assert_eq!(app.store.account(target.id).unwrap().role, Role::Viewer);
}
