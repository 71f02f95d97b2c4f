//! The authorization gate placed in front of every protected operation

use std::sync::Arc;
use tracing::debug;

use crate::bearer::{bearer_from_headers, extract_bearer_token};
use crate::config::{IdentityConfig, IdentityConfigError};
use crate::error::AuthResult;
use crate::jwt::{KeySetSource, TokenVerifier, VerifiedClaims};
use crate::permissions::check_permissions;

/// Runs extraction, verification and the permission check in order
///
/// Cheap to clone; clones share the underlying verifier.
#[derive(Debug, Clone)]
pub struct Authorizer {
    verifier: Arc<TokenVerifier>,
}

impl Authorizer {
    /// Wrap an existing verifier
    pub fn new(verifier: TokenVerifier) -> Self {
        Self {
            verifier: Arc::new(verifier),
        }
    }

    /// Gate that fetches keys over HTTP
    ///
    /// # Errors
    ///
    /// See [`TokenVerifier::new`].
    pub fn from_config(config: &IdentityConfig) -> Result<Self, IdentityConfigError> {
        Ok(Self::new(TokenVerifier::new(config)?))
    }

    /// Gate that takes keys from `keys`
    ///
    /// # Errors
    ///
    /// See [`TokenVerifier::with_source`].
    pub fn with_source(
        config: &IdentityConfig,
        keys: Arc<dyn KeySetSource>,
    ) -> Result<Self, IdentityConfigError> {
        Ok(Self::new(TokenVerifier::with_source(config, keys)?))
    }

    /// The verifier behind this gate
    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    /// Verify a bare token without any permission check
    ///
    /// # Errors
    ///
    /// See [`TokenVerifier::verify`].
    pub async fn verify_token(&self, token: &str) -> AuthResult<VerifiedClaims> {
        self.verifier.verify(token).await
    }

    /// Authorize a request carrying `header` for an operation that needs
    /// `permission` (empty for none)
    ///
    /// # Errors
    ///
    /// The first failing stage's [`crate::AuthError`]; later stages do not run.
    pub async fn authorize(
        &self,
        header: Option<&str>,
        permission: &str,
    ) -> AuthResult<VerifiedClaims> {
        let token = extract_bearer_token(header)?;
        self.authorize_token(token, permission).await
    }

    /// Same as [`Authorizer::authorize`] but reading the `Authorization`
    /// header from a header map
    ///
    /// # Errors
    ///
    /// See [`Authorizer::authorize`] and [`bearer_from_headers`].
    pub async fn authorize_headers(
        &self,
        headers: &http::HeaderMap,
        permission: &str,
    ) -> AuthResult<VerifiedClaims> {
        let token = bearer_from_headers(headers)?;
        self.authorize_token(token, permission).await
    }

    async fn authorize_token(&self, token: &str, permission: &str) -> AuthResult<VerifiedClaims> {
        let claims = self.verify_token(token).await?;
        check_permissions(permission, &claims)?;
        debug!(permission = permission, subject = ?claims.sub, "Request authorized");
        Ok(claims)
    }
}
