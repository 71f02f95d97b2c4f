//! JWKS (JSON Web Key Set) model and fetching
//!
//! The key set is fetched fresh for every verification. Nothing is cached
//! between requests, so a rotated key is picked up on the very next call.
//!
//! # Security Considerations
//!
//! - HTTPS required for key-set endpoints (HTTP only allowed for loopback)
//! - Every fetch is bounded by a timeout and never retried

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};
use url::{Host, Url};

use crate::error::{AuthError, AuthResult};

/// One published public key
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SigningKey {
    /// Key type (`RSA`)
    #[serde(default)]
    pub kty: String,
    /// Key ID, matched against the token header's `kid`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    /// Public key use (`sig`)
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    /// Algorithm the key is meant for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    /// RSA modulus, base64url
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    /// RSA exponent, base64url
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
}

impl SigningKey {
    /// Build an RSA signing key from its base64url components
    pub fn rsa(kid: impl Into<String>, n: impl Into<String>, e: impl Into<String>) -> Self {
        Self {
            kty: "RSA".to_string(),
            kid: Some(kid.into()),
            key_use: Some("sig".to_string()),
            alg: Some("RS256".to_string()),
            n: Some(n.into()),
            e: Some(e.into()),
        }
    }
}

/// The published key set, in document order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeySet {
    /// Keys as listed by the provider
    #[serde(default)]
    pub keys: Vec<SigningKey>,
}

impl KeySet {
    /// Create a key set from a list of keys
    pub fn new(keys: Vec<SigningKey>) -> Self {
        Self { keys }
    }

    /// Find the key whose `kid` equals `kid`
    ///
    /// When several entries share an id the last one in document order wins.
    pub fn select(&self, kid: &str) -> Option<&SigningKey> {
        self.keys
            .iter()
            .rev()
            .find(|key| key.kid.as_deref() == Some(kid))
    }
}

/// Anything that can produce the current key set
#[async_trait]
pub trait KeySetSource: Send + Sync {
    /// Fetch the key set
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::KeySetUnavailable`] if the key set cannot be
    /// obtained.
    async fn fetch(&self) -> AuthResult<KeySet>;
}

/// A fixed, in-memory key set
#[derive(Debug, Clone, Default)]
pub struct StaticKeySet {
    keys: KeySet,
}

impl StaticKeySet {
    /// Serve `keys` on every fetch
    pub fn new(keys: KeySet) -> Self {
        Self { keys }
    }
}

#[async_trait]
impl KeySetSource for StaticKeySet {
    async fn fetch(&self) -> AuthResult<KeySet> {
        Ok(self.keys.clone())
    }
}

/// HTTP client for the provider's `/.well-known/jwks.json`
///
/// # Example
///
/// ```rust,no_run
/// # use patisserie_auth::jwt::{JwksClient, KeySetSource};
/// # use std::time::Duration;
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let client = JwksClient::new(
///     "https://tenant.auth0.com/.well-known/jwks.json",
///     Duration::from_secs(10),
/// )?;
///
/// let keys = client.fetch().await?;
/// if let Some(key) = keys.select("key-id-123") {
///     // Use key for validation
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct JwksClient {
    /// Key-set endpoint URL
    jwks_uri: String,
    /// HTTP client (connection pool only)
    http_client: reqwest::Client,
}

impl JwksClient {
    /// Create a client for `jwks_uri` whose fetches give up after `timeout`
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::KeySetUnavailable`] if the URL is not HTTPS (HTTP
    /// is accepted for loopback hosts) or the HTTP client cannot be built.
    pub fn new(jwks_uri: impl Into<String>, timeout: Duration) -> AuthResult<Self> {
        let jwks_uri = jwks_uri.into();
        ensure_secure_endpoint(&jwks_uri)?;

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::KeySetUnavailable(format!("HTTP client: {e}")))?;

        Ok(Self {
            jwks_uri,
            http_client,
        })
    }

    /// Get the key-set endpoint URI
    pub fn jwks_uri(&self) -> &str {
        &self.jwks_uri
    }
}

#[async_trait]
impl KeySetSource for JwksClient {
    async fn fetch(&self) -> AuthResult<KeySet> {
        debug!(jwks_uri = %self.jwks_uri, "Fetching key set");

        let response = self
            .http_client
            .get(&self.jwks_uri)
            .send()
            .await
            .map_err(|e| {
                error!(jwks_uri = %self.jwks_uri, error = %e, "Failed to fetch key set");
                AuthError::KeySetUnavailable(format!("fetch failed: {e}"))
            })?;

        if !response.status().is_success() {
            error!(
                jwks_uri = %self.jwks_uri,
                status = %response.status(),
                "Key-set endpoint returned error status"
            );
            return Err(AuthError::KeySetUnavailable(format!(
                "endpoint returned status {}",
                response.status()
            )));
        }

        let keys: KeySet = response.json().await.map_err(|e| {
            error!(jwks_uri = %self.jwks_uri, error = %e, "Failed to parse key set JSON");
            AuthError::KeySetUnavailable(format!("invalid key set: {e}"))
        })?;

        info!(
            jwks_uri = %self.jwks_uri,
            key_count = keys.keys.len(),
            "Fetched key set"
        );

        Ok(keys)
    }
}

fn ensure_secure_endpoint(uri: &str) -> AuthResult<()> {
    let url = Url::parse(uri)
        .map_err(|e| AuthError::KeySetUnavailable(format!("invalid key-set URL {uri}: {e}")))?;

    let loopback = match url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    };

    match url.scheme() {
        "https" => Ok(()),
        "http" if loopback => Ok(()),
        _ => Err(AuthError::KeySetUnavailable(
            "key-set endpoint must use HTTPS (HTTP only allowed for loopback)".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(kid: &str, n: &str) -> SigningKey {
        SigningKey::rsa(kid, n, "AQAB")
    }

    #[test]
    fn test_select_by_kid() {
        let keys = KeySet::new(vec![key("a", "n-a"), key("b", "n-b")]);
        assert_eq!(keys.select("b").and_then(|k| k.n.as_deref()), Some("n-b"));
        assert!(keys.select("c").is_none());
    }

    #[test]
    fn test_duplicate_kid_last_wins() {
        let keys = KeySet::new(vec![key("a", "first"), key("b", "n-b"), key("a", "last")]);
        assert_eq!(keys.select("a").and_then(|k| k.n.as_deref()), Some("last"));
    }

    #[test]
    fn test_key_without_kid_never_matches() {
        let mut anonymous = key("x", "n");
        anonymous.kid = None;
        let keys = KeySet::new(vec![anonymous]);
        assert!(keys.select("").is_none());
    }

    #[test]
    fn test_parse_provider_document() {
        let keys: KeySet = serde_json::from_value(serde_json::json!({
            "keys": [{
                "alg": "RS256",
                "kty": "RSA",
                "use": "sig",
                "n": "modulus",
                "e": "AQAB",
                "kid": "abc",
                "x5t": "thumb",
                "x5c": ["cert"]
            }]
        }))
        .unwrap();
        let selected = keys.select("abc").unwrap();
        assert_eq!(selected.key_use.as_deref(), Some("sig"));
        assert_eq!(selected.e.as_deref(), Some("AQAB"));
    }

    #[test]
    fn test_https_required() {
        let timeout = Duration::from_secs(1);
        assert!(JwksClient::new("https://tenant.auth0.com/.well-known/jwks.json", timeout).is_ok());
        assert!(JwksClient::new("http://localhost:8080/jwks", timeout).is_ok());
        assert!(JwksClient::new("http://127.0.0.1:8080/jwks", timeout).is_ok());
        assert!(JwksClient::new("http://[::1]:8080/jwks", timeout).is_ok());
        assert!(matches!(
            JwksClient::new("http://tenant.auth0.com/jwks", timeout),
            Err(AuthError::KeySetUnavailable(_))
        ));
        assert!(JwksClient::new("not a url", timeout).is_err());
    }

    #[tokio::test]
    async fn test_static_source() {
        let source = StaticKeySet::new(KeySet::new(vec![key("a", "n")]));
        let keys = source.fetch().await.unwrap();
        assert_eq!(keys.keys.len(), 1);
    }
}
