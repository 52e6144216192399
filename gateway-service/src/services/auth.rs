//! Request authentication: credential selection, verification and context
//! resolution behind one call.

use axum::http::HeaderMap;

use super::credentials::bearer_token;
use super::{
    AuthContextResolver, AuthRequirement, CredentialVerifier, PresentedCredential, ServiceError,
};
use crate::models::{AuthContext, CredentialKind};

/// A rejected request, with the credential kind that was presented when
/// one was recognised.
#[derive(Debug)]
pub struct AuthFailure {
    pub error: ServiceError,
    pub kind: Option<CredentialKind>,
}

impl AuthFailure {
    fn new(error: ServiceError, kind: Option<CredentialKind>) -> Self {
        Self { error, kind }
    }
}

#[derive(Clone)]
pub struct AuthService {
    verifier: CredentialVerifier,
    resolver: AuthContextResolver,
}

impl AuthService {
    pub fn new(verifier: CredentialVerifier, resolver: AuthContextResolver) -> Self {
        Self { verifier, resolver }
    }

    pub fn verifier(&self) -> &CredentialVerifier {
        &self.verifier
    }

    #[tracing::instrument(skip(self, headers), fields(kind = tracing::field::Empty))]
    pub async fn authenticate(
        &self,
        headers: &HeaderMap,
        requirement: &AuthRequirement,
    ) -> Result<AuthContext, AuthFailure> {
        let credential = self
            .verifier
            .extract(headers)
            .map_err(|e| AuthFailure::new(e, None))?;

        let kind = match credential {
            PresentedCredential::Bearer(_) => CredentialKind::User,
            PresentedCredential::ApiKey(_) => CredentialKind::ApiKey,
        };
        tracing::Span::current().record("kind", tracing::field::debug(kind));

        let claims = self
            .verifier
            .verify(credential)
            .await
            .map_err(|e| AuthFailure::new(e, Some(kind)))?;

        self.resolver
            .resolve(claims, requirement)
            .await
            .map_err(|e| AuthFailure::new(e, Some(kind)))
    }

    /// Token-only authentication with no store lookups. The context is built
    /// from the signed claims as issued.
    pub fn authenticate_token(&self, headers: &HeaderMap) -> Result<AuthContext, AuthFailure> {
        let raw = bearer_token(headers)
            .ok_or_else(|| AuthFailure::new(ServiceError::AuthenticationRequired, None))?;
        let token = std::str::from_utf8(raw).map_err(|_| {
            AuthFailure::new(ServiceError::InvalidCredential, Some(CredentialKind::User))
        })?;

        let claims = self
            .verifier
            .verify_token(token.trim())
            .map_err(|e| AuthFailure::new(e, Some(CredentialKind::User)))?;

        Ok(AuthContext::user(claims.user_id, claims.role, claims.operator_id))
    }
}
