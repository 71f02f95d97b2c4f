//! # Patisserie Auth - Bearer Token Authorization
//!
//! Verifies bearer tokens issued by a third-party identity provider and
//! enforces scope-style permissions before a protected operation runs.
//!
//! ## Pipeline
//!
//! Every protected request goes through four stages, each of which can stop
//! the request with a typed [`AuthError`]:
//!
//! 1. [`extract_bearer_token`] - read `Authorization: Bearer <token>`
//! 2. key resolution - fetch the provider's key set and select the token's `kid`
//! 3. [`TokenVerifier::verify`] - signature, issuer, audience and expiry
//! 4. [`check_permissions`] - the operation's permission must be granted
//!
//! [`Authorizer`] runs the stages in order and
//! [`tower::RequirePermissionLayer`] does the same as middleware.
//!
//! ## Architecture
//!
//! - [`bearer`] - header parsing
//! - [`jwt`] - key sets and token verification
//! - [`permissions`] - permission checks on verified claims
//! - [`gate`] - the combined gate
//! - [`tower`] - Tower Layer/Service integration
//! - [`config`] - identity provider settings
//! - [`error`] - failure taxonomy
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use patisserie_auth::{Authorizer, IdentityConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let authorizer = Authorizer::from_config(&IdentityConfig::from_env()?)?;
//!
//! match authorizer.authorize(Some("Bearer eyJ..."), "get:drinks-detail").await {
//!     Ok(claims) => println!("granted to {:?}", claims.sub),
//!     Err(e) => println!("{} {}: {}", e.status(), e.code(), e),
//! }
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

pub mod bearer;
pub mod config;
pub mod error;
pub mod gate;
pub mod jwt;
pub mod permissions;
pub mod tower;

pub use bearer::{bearer_from_headers, extract_bearer_token};
pub use config::{IdentityConfig, IdentityConfigError};
pub use error::{AuthError, AuthFailure, AuthResult};
pub use gate::Authorizer;
pub use jwt::{
    Audience, JwksClient, KeySet, KeySetSource, SigningKey, StaticKeySet, TokenVerifier,
    VerifiedClaims,
};
pub use permissions::check_permissions;
