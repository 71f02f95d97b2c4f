//! # Patisserie Server
//!
//! HTTP service for a coffee-shop menu of drinks and cakes. Reading the public
//! drink list is open to anyone; every other operation requires a bearer token
//! carrying the matching permission, checked by [`patisserie_auth`].
//!
//! ## Features
//!
//! - **Permission-gated routes** - one permission per method and path
//! - **Short and long views** - ingredient names only for `get:drinks-detail`
//! - **Layered configuration** - defaults, a TOML/YAML/JSON file and
//!   `PATISSERIE_*` environment variables
//! - **Graceful shutdown** - in-flight requests finish on Ctrl+C
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use patisserie_server::{Server, ServerConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::builder()
//!     .identity("tenant.auth0.com", "coffee")
//!     .port(5000)
//!     .build();
//!
//! Server::from_config(config).await?.run().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Bring Your Own Router
//!
//! [`Server::router`] returns a plain [`axum::Router`] that can be nested
//! into a larger application or driven directly with `tower::ServiceExt`.

#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod routes;
pub mod server;
pub mod store;

pub use config::{
    ConfigError, ConfigurationBuilder, CorsConfig, ENV_PREFIX, LoggingConfig, ServerConfig,
};
pub use error::{ApiError, ApiResult};
pub use logging::LoggingGuard;
pub use models::{Cake, CakePatch, Drink, DrinkPatch, NewCake, NewDrink, RecipeInput, RecipePart};
pub use routes::AppState;
pub use server::{Server, ServerError, ServerResult};
pub use store::{MemoryStore, Repository, StoreError, StoreResult};
