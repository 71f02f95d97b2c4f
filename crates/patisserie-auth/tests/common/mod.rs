//! Common test utilities for integration tests
//!
//! Provides an RSA key pair shared by every test, a token signer, and a
//! wiremock server publishing the key set.

#![allow(dead_code)]

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use patisserie_auth::{IdentityConfig, KeySet, SigningKey};
use serde_json::{Value, json};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

pub const DOMAIN: &str = "tenant.auth0.test";
pub const AUDIENCE: &str = "coffee";
pub const KID: &str = "test-key-1";

/// RSA key material generated once per test binary
pub struct TestKeys {
    pub private_pem: Vec<u8>,
    pub n: String,
    pub e: String,
}

pub fn test_keys() -> &'static TestKeys {
    static KEYS: OnceLock<TestKeys> = OnceLock::new();
    KEYS.get_or_init(generate_test_rsa_keypair)
}

/// Generate a test RSA key pair (PKCS#1 PEM plus JWK components)
fn generate_test_rsa_keypair() -> TestKeys {
    use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
    use rsa::traits::PublicKeyParts;
    use rsa::RsaPrivateKey;

    let mut rng = rand::thread_rng();
    let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("Failed to generate RSA key");

    let private_pem = private_key
        .to_pkcs1_pem(LineEnding::LF)
        .expect("Failed to encode private key")
        .as_bytes()
        .to_vec();

    TestKeys {
        private_pem,
        n: URL_SAFE_NO_PAD.encode(private_key.n().to_bytes_be()),
        e: URL_SAFE_NO_PAD.encode(private_key.e().to_bytes_be()),
    }
}

/// The published form of the shared key under `kid`
pub fn signing_key(kid: &str) -> SigningKey {
    let keys = test_keys();
    SigningKey::rsa(kid, keys.n.clone(), keys.e.clone())
}

pub fn key_set() -> KeySet {
    KeySet::new(vec![signing_key(KID)])
}

/// Get current Unix timestamp
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_secs()
}

/// Claims accepted by [`identity`] with the given permissions
pub fn claims(permissions: &[&str], exp_offset_secs: i64) -> Value {
    let now = current_timestamp();
    json!({
        "iss": format!("https://{DOMAIN}/"),
        "sub": "auth0|barista",
        "aud": AUDIENCE,
        "iat": now,
        "exp": (now as i64 + exp_offset_secs) as u64,
        "permissions": permissions,
    })
}

/// Sign `claims` with the shared key, naming `kid` in the header
pub fn sign(claims: &Value, kid: Option<&str>) -> String {
    let key = EncodingKey::from_rsa_pem(&test_keys().private_pem).expect("Invalid RSA key");
    let mut header = Header::new(Algorithm::RS256);
    header.typ = Some("JWT".to_string());
    header.kid = kid.map(str::to_string);
    encode(&header, claims, &key).expect("Failed to encode test JWT")
}

/// Valid token granting `permissions`
pub fn token(permissions: &[&str]) -> String {
    sign(&claims(permissions, 3600), Some(KID))
}

/// Key-set mock server
pub struct MockIdentityProvider {
    pub server: MockServer,
    pub jwks_endpoint: String,
}

impl MockIdentityProvider {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let jwks_endpoint = format!("{}/.well-known/jwks.json", server.uri());
        Self {
            server,
            jwks_endpoint,
        }
    }

    /// Publish `keys` on the JWKS endpoint
    pub async fn mock_jwks(&self, keys: &KeySet) {
        Mock::given(method("GET"))
            .and(path("/.well-known/jwks.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(keys))
            .mount(&self.server)
            .await;
    }

    /// Make the JWKS endpoint fail
    pub async fn mock_jwks_error(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path("/.well-known/jwks.json"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Identity settings pointing at this server
    pub fn identity(&self) -> IdentityConfig {
        IdentityConfig::new(DOMAIN, AUDIENCE).with_jwks_uri(self.jwks_endpoint.clone())
    }
}
