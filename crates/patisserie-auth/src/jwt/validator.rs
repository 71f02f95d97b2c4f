//! Bearer token verification
//!
//! A token is accepted only when:
//! - its header names a `kid` present in the provider's key set
//! - it is signed with an allowed algorithm by that key
//! - `iss` equals `https://{domain}/` and `aud` contains the configured audience
//! - `exp` has not passed (and `nbf`, when present, has)

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, TokenData, Validation, decode, decode_header};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::VerifiedClaims;
use super::jwks::{JwksClient, KeySetSource, SigningKey};
use crate::config::{IdentityConfig, IdentityConfigError};
use crate::error::{AuthError, AuthResult};

/// Verifies bearer tokens against a [`KeySetSource`]
///
/// # Example
///
/// ```rust,no_run
/// # use patisserie_auth::{IdentityConfig, TokenVerifier};
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let verifier = TokenVerifier::new(&IdentityConfig::new("tenant.auth0.com", "coffee"))?;
///
/// match verifier.verify("eyJ0eXAi...").await {
///     Ok(claims) => println!("Valid token for: {:?}", claims.sub),
///     Err(e) => println!("Rejected: {} ({})", e, e.code()),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TokenVerifier {
    /// Expected issuer (iss claim)
    expected_issuer: String,
    /// Expected audience (aud claim)
    expected_audience: String,
    /// Where keys come from
    keys: Arc<dyn KeySetSource>,
    /// Clock skew tolerated on exp/nbf
    leeway: Duration,
    /// Algorithms a token may be signed with
    allowed_algorithms: Vec<Algorithm>,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("expected_issuer", &self.expected_issuer)
            .field("expected_audience", &self.expected_audience)
            .field("leeway", &self.leeway)
            .field("allowed_algorithms", &self.allowed_algorithms)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier {
    /// Verifier that fetches keys over HTTP from the configured key-set location
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is incomplete or the key-set
    /// endpoint is not acceptable.
    pub fn new(config: &IdentityConfig) -> Result<Self, IdentityConfigError> {
        config.validate()?;
        let client = JwksClient::new(config.jwks_uri(), config.fetch_timeout())
            .map_err(|e| match e {
                AuthError::KeySetUnavailable(detail) => IdentityConfigError::Endpoint(detail),
                other => IdentityConfigError::Endpoint(other.to_string()),
            })?;
        Self::with_source(config, Arc::new(client))
    }

    /// Verifier that takes keys from an arbitrary source
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is incomplete.
    pub fn with_source(
        config: &IdentityConfig,
        keys: Arc<dyn KeySetSource>,
    ) -> Result<Self, IdentityConfigError> {
        config.validate()?;
        Ok(Self {
            expected_issuer: config.issuer(),
            expected_audience: config.audience.clone(),
            keys,
            leeway: Duration::from_secs(config.leeway_secs),
            allowed_algorithms: config.parsed_algorithms()?,
        })
    }

    /// Override the tolerated clock skew
    #[must_use]
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    /// Verify `token` and return its claims
    ///
    /// The key set is fetched once per call.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Undecodable`] if the token header cannot be read, the
    ///   algorithm is not allowed, the key cannot be used or the signature fails
    /// - [`AuthError::MissingKeyId`] if the header has no `kid`
    /// - [`AuthError::KeyNotFound`] if no published key carries that `kid`
    /// - [`AuthError::TokenExpired`] if `exp` has passed
    /// - [`AuthError::InvalidClaims`] on issuer or audience mismatch, a missing
    ///   `iss`/`aud`/`exp`, or a token that is not yet valid
    /// - [`AuthError::KeySetUnavailable`] if the key set cannot be fetched
    pub async fn verify(&self, token: &str) -> AuthResult<VerifiedClaims> {
        let header = decode_header(token).map_err(|e| {
            debug!(error = %e, "Failed to decode token header");
            AuthError::Undecodable(format!("header: {e}"))
        })?;

        let key_id = header.kid.ok_or_else(|| {
            debug!("Token header carries no kid");
            AuthError::MissingKeyId
        })?;

        // Header and kid are checked before the fetch so a malformed token
        // never reaches the provider. A kid-less token during a key-set outage
        // is therefore 401, not 500.
        let key_set = self.keys.fetch().await?;
        let key = key_set.select(&key_id).ok_or_else(|| {
            warn!(key_id = %key_id, "Key ID not found in key set");
            AuthError::KeyNotFound
        })?;

        if !self.allowed_algorithms.contains(&header.alg) {
            warn!(
                algorithm = ?header.alg,
                allowed = ?self.allowed_algorithms,
                "Token algorithm not allowed"
            );
            return Err(AuthError::Undecodable(format!(
                "algorithm {:?} not allowed",
                header.alg
            )));
        }

        let decoding_key = decoding_key(key)?;

        let mut validation = Validation::new(header.alg);
        validation.algorithms = self.allowed_algorithms.clone();
        validation.set_audience(&[&self.expected_audience]);
        validation.set_issuer(&[&self.expected_issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.validate_nbf = true;
        validation.leeway = self.leeway.as_secs();

        let token_data: TokenData<VerifiedClaims> = decode(token, &decoding_key, &validation)
            .map_err(|e| {
                let mapped = classify(e.kind());
                warn!(
                    error = %e,
                    code = mapped.code(),
                    key_id = %key_id,
                    issuer = %self.expected_issuer,
                    audience = %self.expected_audience,
                    "Token verification failed"
                );
                mapped
            })?;

        debug!(
            key_id = %key_id,
            subject = ?token_data.claims.sub,
            algorithm = ?header.alg,
            "Token verified"
        );

        Ok(token_data.claims)
    }

    /// Get the expected issuer
    pub fn expected_issuer(&self) -> &str {
        &self.expected_issuer
    }

    /// Get the expected audience
    pub fn expected_audience(&self) -> &str {
        &self.expected_audience
    }
}

fn decoding_key(key: &SigningKey) -> AuthResult<DecodingKey> {
    if !key.kty.eq_ignore_ascii_case("RSA") {
        return Err(AuthError::Undecodable(format!(
            "unsupported key type {:?}",
            key.kty
        )));
    }
    let (Some(n), Some(e)) = (key.n.as_deref(), key.e.as_deref()) else {
        return Err(AuthError::Undecodable(
            "RSA key lacks modulus or exponent".to_string(),
        ));
    };
    DecodingKey::from_rsa_components(n, e)
        .map_err(|err| AuthError::Undecodable(format!("unusable key: {err}")))
}

fn classify(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::InvalidAudience
        | ErrorKind::InvalidIssuer
        | ErrorKind::MissingRequiredClaim(_)
        | ErrorKind::ImmatureSignature => AuthError::InvalidClaims,
        other => AuthError::Undecodable(format!("{other:?}")),
    }
}
