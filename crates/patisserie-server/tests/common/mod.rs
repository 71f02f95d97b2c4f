//! Common test utilities for API tests
//!
//! Builds the router against an in-memory store and a fixed key set, and
//! signs tokens with a key pair generated once per test binary.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use patisserie_auth::{Authorizer, IdentityConfig, KeySet, SigningKey, StaticKeySet};
use patisserie_server::{
    Cake, CakePatch, Drink, DrinkPatch, MemoryStore, NewCake, NewDrink, Repository, Server,
    ServerConfig, StoreResult, store,
};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

pub const DOMAIN: &str = "tenant.auth0.test";
pub const AUDIENCE: &str = "coffee";
pub const KID: &str = "api-test-key";

/// Every permission the API knows about
pub const ALL_PERMISSIONS: &[&str] = &[
    "get:drinks-detail",
    "post:drinks",
    "patch:drinks",
    "delete:drinks",
    "get:cakes",
    "post:cakes",
    "patch:cakes",
    "delete:cakes",
];

struct TestKeys {
    private_pem: Vec<u8>,
    n: String,
    e: String,
}

fn test_keys() -> &'static TestKeys {
    static KEYS: OnceLock<TestKeys> = OnceLock::new();
    KEYS.get_or_init(|| {
        use rsa::RsaPrivateKey;
        use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
        use rsa::traits::PublicKeyParts;

        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("Failed to generate RSA key");
        TestKeys {
            private_pem: private_key
                .to_pkcs1_pem(LineEnding::LF)
                .expect("Failed to encode private key")
                .as_bytes()
                .to_vec(),
            n: URL_SAFE_NO_PAD.encode(private_key.n().to_bytes_be()),
            e: URL_SAFE_NO_PAD.encode(private_key.e().to_bytes_be()),
        }
    })
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_secs()
}

/// Sign arbitrary claims with the test key
pub fn sign(claims: &Value) -> String {
    let key = EncodingKey::from_rsa_pem(&test_keys().private_pem).expect("Invalid RSA key");
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(KID.to_string());
    encode(&header, claims, &key).expect("Failed to encode test JWT")
}

/// Claims from the test tenant granting `permissions`
pub fn claims(permissions: &[&str], exp_offset_secs: i64) -> Value {
    json!({
        "iss": format!("https://{DOMAIN}/"),
        "sub": "auth0|manager",
        "aud": AUDIENCE,
        "exp": (now() as i64 + exp_offset_secs) as u64,
        "permissions": permissions,
    })
}

/// `Bearer <token>` granting `permissions`
pub fn bearer(permissions: &[&str]) -> String {
    format!("Bearer {}", sign(&claims(permissions, 3600)))
}

/// `Bearer <token>` granting everything
pub fn manager() -> String {
    bearer(ALL_PERMISSIONS)
}

pub fn authorizer() -> Authorizer {
    let keys = KeySet::new(vec![SigningKey::rsa(
        KID,
        test_keys().n.clone(),
        test_keys().e.clone(),
    )]);
    Authorizer::with_source(
        &IdentityConfig::new(DOMAIN, AUDIENCE),
        Arc::new(StaticKeySet::new(keys)),
    )
    .expect("valid identity config")
}

fn config() -> ServerConfig {
    ServerConfig::builder().identity(DOMAIN, AUDIENCE).build()
}

/// Router over `store`
pub fn app_with(store: Arc<dyn Repository>) -> Router {
    Server::with_parts(config(), authorizer(), store)
        .router()
        .expect("router")
}

/// Router over a store holding the sample drink
pub async fn app() -> Router {
    let store = MemoryStore::new();
    store::seed(&store).await.expect("seed");
    app_with(Arc::new(store))
}

/// Send one request and decode the JSON body
pub async fn send(app: &Router, request: Request<Body>) -> (Response<()>, Value) {
    let response = app.clone().oneshot(request).await.expect("infallible");
    let (parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("read body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };
    (Response::from_parts(parts, ()), value)
}

/// Build a request with an optional `Authorization` header and JSON body
pub fn request(method: &str, uri: &str, auth: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

/// Repository wrapper counting every call that reaches storage
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    pub calls: AtomicUsize,
}

impl CountingStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Repository for CountingStore {
    async fn list_drinks(&self) -> StoreResult<Vec<Drink>> {
        self.hit();
        self.inner.list_drinks().await
    }

    async fn insert_drink(&self, drink: NewDrink) -> StoreResult<Drink> {
        self.hit();
        self.inner.insert_drink(drink).await
    }

    async fn update_drink(&self, id: u64, patch: DrinkPatch) -> StoreResult<Drink> {
        self.hit();
        self.inner.update_drink(id, patch).await
    }

    async fn delete_drink(&self, id: u64) -> StoreResult<()> {
        self.hit();
        self.inner.delete_drink(id).await
    }

    async fn list_cakes(&self) -> StoreResult<Vec<Cake>> {
        self.hit();
        self.inner.list_cakes().await
    }

    async fn insert_cake(&self, cake: NewCake) -> StoreResult<Cake> {
        self.hit();
        self.inner.insert_cake(cake).await
    }

    async fn update_cake(&self, id: u64, patch: CakePatch) -> StoreResult<Cake> {
        self.hit();
        self.inner.update_cake(id, patch).await
    }

    async fn delete_cake(&self, id: u64) -> StoreResult<()> {
        self.hit();
        self.inner.delete_cake(id).await
    }

    async fn reset(&self) -> StoreResult<()> {
        self.inner.reset().await
    }
}
