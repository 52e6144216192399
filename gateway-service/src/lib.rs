pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    security_headers::security_headers_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::models::Role;
use crate::services::{
    AccountService, AccountStore, ApiKeyAuditor, AuthContextResolver, AuthRequirement,
    AuthService, CredentialVerifier, IdentityProvider, JwtService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: GatewayConfig,
    pub auth: AuthService,
    pub accounts: AccountService,
}

impl AppState {
    /// Wire the services around the given collaborators.
    pub fn new(
        config: GatewayConfig,
        store: Arc<dyn AccountStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Result<Self, AppError> {
        let jwt = JwtService::new(&config.jwt);

        let api_key_header = HeaderName::from_bytes(config.security.api_key_header.as_bytes())
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("API_KEY_HEADER: {}", e)))?;

        let verifier = CredentialVerifier::new(jwt.clone(), store.clone(), api_key_header);
        let resolver = AuthContextResolver::new(store.clone(), ApiKeyAuditor::new(store.clone()));
        let auth = AuthService::new(verifier, resolver);
        let accounts = AccountService::new(store, identity, jwt);

        Ok(Self {
            config,
            auth,
            accounts,
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    let protected = |requirement: AuthRequirement| {
        from_fn_with_state((state.clone(), requirement), middleware::require_auth)
    };

    let admin_routes = Router::new()
        .route("/users", post(handlers::users::create_user))
        .route(
            "/users/:id",
            patch(handlers::users::update_user).delete(handlers::users::delete_user),
        )
        .route_layer(protected(AuthRequirement::role(Role::Admin)));

    let api_key_routes = Router::new()
        .route("/api-keys", post(handlers::api_keys::create_api_key))
        .route_layer(protected(AuthRequirement::role(Role::User)));

    let operator_routes = Router::new()
        .route("/operators/ping", get(handlers::operators::ping))
        .route_layer(protected(AuthRequirement::operator()));

    let token_routes = Router::new()
        .route("/auth/me", get(handlers::auth::me))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_token));

    let api_key_header = state.auth.verifier().api_key_header().clone();
    let origins = &state.config.security.allowed_origins;
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins.iter().filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %o, error = %e, "Ignoring invalid CORS origin");
                None
            }
        }))
    };

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/auth/login", post(handlers::auth::login))
        .route("/users/bootstrap", post(handlers::users::bootstrap))
        .merge(token_routes)
        .merge(admin_routes)
        .merge(api_key_routes)
        .merge(operator_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(allow_origin)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    header::AUTHORIZATION,
                    header::CONTENT_TYPE,
                    HeaderName::from_static(REQUEST_ID_HEADER),
                    api_key_header,
                ]),
        )
}
