//! # Tower Middleware Integration
//!
//! [`RequirePermissionLayer`] wraps a service with the full authorization gate
//! for one permission. Requests that fail any stage are answered directly with
//! the JSON failure body; the inner service is never called for them.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use axum::{Router, handler::Handler, routing::get};
//! use patisserie_auth::tower::RequirePermissionLayer;
//!
//! let app = Router::new().route(
//!     "/drinks-detail",
//!     get(drinks_detail.layer(RequirePermissionLayer::new(authorizer, "get:drinks-detail"))),
//! );
//! ```
//!
//! ## Request Extensions
//!
//! On success the [`VerifiedClaims`](crate::VerifiedClaims) are inserted into
//! the request's extensions:
//!
//! ```rust,ignore
//! async fn drinks_detail(Extension(claims): Extension<VerifiedClaims>) { /* .. */ }
//! ```

mod layer;
mod service;

pub use layer::RequirePermissionLayer;
pub use service::{RequirePermission, RequirePermissionFuture};
