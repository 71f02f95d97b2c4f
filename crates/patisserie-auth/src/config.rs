//! Identity provider settings

use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Environment variable holding the identity provider's domain
pub const DOMAIN_ENV: &str = "AUTH0_DOMAIN";
/// Environment variable holding the allowed signing algorithms
pub const ALGORITHMS_ENV: &str = "ALGORITHMS";
/// Environment variable holding the expected audience
pub const AUDIENCE_ENV: &str = "API_AUDIENCE";

/// Errors raised while assembling an [`IdentityConfig`]
#[derive(Debug, thiserror::Error)]
pub enum IdentityConfigError {
    /// A required setting was not provided
    #[error("missing identity setting: {0}")]
    Missing(&'static str),

    /// An algorithm name could not be parsed
    #[error("unknown signing algorithm: {0}")]
    UnknownAlgorithm(String),

    /// An algorithm that cannot be verified with a published public key
    #[error("signing algorithm {0:?} is not allowed for key-set verification")]
    UnsupportedAlgorithm(Algorithm),

    /// The key-set endpoint is unusable
    #[error("invalid key-set endpoint: {0}")]
    Endpoint(String),

    /// A key-set fetch would give up before it could complete
    #[error("key-set fetch timeout must be at least one millisecond")]
    ZeroFetchTimeout,
}

/// Where and how bearer tokens are verified
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IdentityConfig {
    /// Identity provider domain, e.g. `tenant.eu.auth0.com`
    pub domain: String,
    /// Expected `aud` claim
    pub audience: String,
    /// Algorithms a token may be signed with
    pub algorithms: Vec<String>,
    /// Key-set location; derived from `domain` when unset
    pub jwks_uri: Option<String>,
    /// Upper bound on a single key-set fetch, in milliseconds
    pub fetch_timeout_ms: u64,
    /// Clock skew tolerated on `exp` and `nbf`, in whole seconds
    pub leeway_secs: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            audience: String::new(),
            algorithms: vec!["RS256".to_string()],
            jwks_uri: None,
            fetch_timeout_ms: 10_000,
            leeway_secs: 0,
        }
    }
}

impl IdentityConfig {
    /// Create a configuration for `domain` and `audience` with default algorithms
    pub fn new(domain: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            audience: audience.into(),
            ..Self::default()
        }
    }

    /// Read `AUTH0_DOMAIN`, `ALGORITHMS` and `API_AUDIENCE`
    ///
    /// `ALGORITHMS` may be comma or whitespace separated and defaults to `RS256`.
    ///
    /// # Errors
    ///
    /// Returns an error if the domain or audience is unset, or an algorithm is
    /// unknown or symmetric.
    pub fn from_env() -> Result<Self, IdentityConfigError> {
        let config = Self::default().with_env_fallback();
        if config.domain.is_empty() {
            return Err(IdentityConfigError::Missing(DOMAIN_ENV));
        }
        if config.audience.is_empty() {
            return Err(IdentityConfigError::Missing(AUDIENCE_ENV));
        }
        config.validate()?;
        Ok(config)
    }

    /// Fill an empty domain or audience from the environment, and take
    /// `ALGORITHMS` when it is set
    #[must_use]
    pub fn with_env_fallback(mut self) -> Self {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if self.domain.trim().is_empty()
            && let Some(domain) = read(DOMAIN_ENV)
        {
            self.domain = domain;
        }
        if self.audience.trim().is_empty()
            && let Some(audience) = read(AUDIENCE_ENV)
        {
            self.audience = audience;
        }
        if let Some(raw) = read(ALGORITHMS_ENV) {
            let algorithms = split_algorithms(&raw);
            if !algorithms.is_empty() {
                self.algorithms = algorithms;
            }
        }
        self
    }

    /// Set the allowed algorithms
    #[must_use]
    pub fn with_algorithms<I, S>(mut self, algorithms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.algorithms = algorithms.into_iter().map(Into::into).collect();
        self
    }

    /// Fetch the key set from an explicit location instead of the domain
    #[must_use]
    pub fn with_jwks_uri(mut self, uri: impl Into<String>) -> Self {
        self.jwks_uri = Some(uri.into());
        self
    }

    /// Set the fetch timeout, kept at millisecond precision
    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the expiry leeway
    ///
    /// Token timestamps are whole seconds, so a fractional leeway is rounded up.
    #[must_use]
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway_secs = leeway.as_secs() + u64::from(leeway.subsec_nanos() > 0);
        self
    }

    /// Expected `iss` claim: `https://{domain}/`
    pub fn issuer(&self) -> String {
        format!("https://{}/", self.domain)
    }

    /// Key-set location: the override, or `https://{domain}/.well-known/jwks.json`
    pub fn jwks_uri(&self) -> String {
        self.jwks_uri
            .clone()
            .unwrap_or_else(|| format!("https://{}/.well-known/jwks.json", self.domain))
    }

    /// Fetch timeout as a [`Duration`]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Parse the configured algorithm names
    ///
    /// # Errors
    ///
    /// Returns an error for unknown names and for `HS*` algorithms, which a
    /// published key set cannot verify.
    pub fn parsed_algorithms(&self) -> Result<Vec<Algorithm>, IdentityConfigError> {
        self.algorithms
            .iter()
            .map(|name| {
                let algorithm = Algorithm::from_str(name.trim())
                    .map_err(|_| IdentityConfigError::UnknownAlgorithm(name.clone()))?;
                match algorithm {
                    Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
                        Err(IdentityConfigError::UnsupportedAlgorithm(algorithm))
                    }
                    other => Ok(other),
                }
            })
            .collect()
    }

    /// Check that the configuration can drive verification
    ///
    /// # Errors
    ///
    /// Returns an error if the domain, audience or algorithm list is empty,
    /// the fetch timeout is zero, or an algorithm is rejected by
    /// [`IdentityConfig::parsed_algorithms`].
    pub fn validate(&self) -> Result<(), IdentityConfigError> {
        if self.domain.trim().is_empty() {
            return Err(IdentityConfigError::Missing("domain"));
        }
        if self.audience.trim().is_empty() {
            return Err(IdentityConfigError::Missing("audience"));
        }
        if self.parsed_algorithms()?.is_empty() {
            return Err(IdentityConfigError::Missing("algorithms"));
        }
        if self.fetch_timeout_ms == 0 {
            return Err(IdentityConfigError::ZeroFetchTimeout);
        }
        Ok(())
    }
}

fn split_algorithms(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(|part| part.trim_matches(|c| c == '"' || c == '\'' || c == '[' || c == ']'))
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}
