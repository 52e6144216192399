//! Services layer for the gateway.
//!
//! Credential verification, context resolution, lifecycle hooks and the
//! collaborators they talk to.

mod accounts;
mod audit;
mod auth;
mod credentials;
mod database;
pub mod error;
mod identity;
mod jwt;
mod lifecycle;
mod resolver;
mod store;

pub use accounts::{AccountService, IssuedApiKey};
pub use audit::ApiKeyAuditor;
pub use auth::{AuthFailure, AuthService};
pub use credentials::{
    CredentialVerifier, PresentedCredential, VerifiedClaims, DEFAULT_API_KEY_HEADER,
};
pub use database::Database;
pub use error::ServiceError;
pub use identity::{IdentityError, IdentityProvider, IdentityServiceClient, MockIdentityProvider};
pub use jwt::{AccessTokenClaims, JwtService, TokenResponse};
pub use lifecycle::IdentityLifecycle;
pub use resolver::{AuthContextResolver, AuthRequirement};
pub use store::{AccountStore, MockAccountStore};
