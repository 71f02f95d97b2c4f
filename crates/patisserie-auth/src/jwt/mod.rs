//! Token verification against the identity provider's published keys
//!
//! - `jwks` - key-set model and fetching
//! - `validator` - signature and registered-claim verification

pub mod jwks;
pub mod validator;

pub use jwks::{JwksClient, KeySet, KeySetSource, SigningKey, StaticKeySet};
pub use validator::TokenVerifier;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The `aud` claim, which may be a single string or a list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Audience {
    /// `"aud": "coffee"`
    One(String),
    /// `"aud": ["coffee", "https://tenant/userinfo"]`
    Many(Vec<String>),
}

impl Audience {
    /// Whether `audience` is among the listed recipients
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Self::One(aud) => aud == audience,
            Self::Many(auds) => auds.iter().any(|aud| aud == audience),
        }
    }
}

/// Claims of a token whose signature, issuer, audience and expiry checked out
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerifiedClaims {
    /// Issuer (iss)
    pub iss: String,

    /// Audience (aud)
    pub aud: Audience,

    /// Expiration Time (exp) - Unix timestamp
    pub exp: u64,

    /// Subject (sub)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Granted permission strings; absent when the provider did not attach any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,

    /// Any other claims
    #[serde(flatten)]
    pub additional: HashMap<String, serde_json::Value>,
}

impl VerifiedClaims {
    /// Whether the token grants `permission`
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions
            .as_ref()
            .is_some_and(|granted| granted.iter().any(|p| p == permission))
    }

    /// Look up a claim that is not modelled as a field
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.additional.get(name)
    }
}
