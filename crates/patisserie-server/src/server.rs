//! Server assembly and lifecycle

use axum::Router;
use patisserie_auth::{Authorizer, IdentityConfigError};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::routes::{self, AppState};
use crate::store::{self, MemoryStore, Repository, StoreError};

/// Errors raised while starting or running the server
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Identity provider settings are unusable
    #[error("Invalid identity configuration: {0}")]
    Identity(#[from] IdentityConfigError),

    /// Initial data could not be prepared
    #[error("Store initialization failed: {0}")]
    Store(#[from] StoreError),

    /// Listener could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// Requested address
        addr: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Serving failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An allowed CORS origin is not a valid header value
    #[error("Invalid CORS origin: {0:?}")]
    InvalidOrigin(String),
}

/// Result alias for server operations
pub type ServerResult<T> = Result<T, ServerError>;

/// The drinks and cakes HTTP service
pub struct Server {
    config: ServerConfig,
    authorizer: Authorizer,
    store: Arc<dyn Repository>,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("authorizer", &self.authorizer)
            .finish_non_exhaustive()
    }
}

impl Server {
    /// Build a server from configuration
    ///
    /// The store starts from a clean state: seeded with the sample drink when
    /// `seed_sample_data` is set, empty otherwise.
    ///
    /// # Errors
    ///
    /// Fails when the identity settings are invalid or the store cannot be
    /// prepared.
    pub async fn from_config(config: ServerConfig) -> ServerResult<Self> {
        config.auth.validate()?;
        let authorizer = Authorizer::from_config(&config.auth)?;

        let store = MemoryStore::new();
        if config.seed_sample_data {
            store::seed(&store).await?;
        } else {
            store.reset().await?;
        }

        Ok(Self::with_parts(config, authorizer, Arc::new(store)))
    }

    /// Build a server from already constructed parts
    pub fn with_parts(
        config: ServerConfig,
        authorizer: Authorizer,
        store: Arc<dyn Repository>,
    ) -> Self {
        Self {
            config,
            authorizer,
            store,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Application router with tracing and CORS applied
    ///
    /// # Errors
    ///
    /// Fails when a configured CORS origin is not a valid header value.
    pub fn router(&self) -> ServerResult<Router> {
        let cors = routes::cors_layer(&self.config.cors).map_err(ServerError::InvalidOrigin)?;
        Ok(routes::router(
            AppState::new(Arc::clone(&self.store)),
            &self.authorizer,
            cors,
        ))
    }

    /// Serve until Ctrl+C
    ///
    /// # Errors
    ///
    /// See [`Server::run_until`].
    pub async fn run(self) -> ServerResult<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Serve until `shutdown` completes, then drain in-flight requests
    ///
    /// # Errors
    ///
    /// Fails when the listener cannot be bound or serving fails.
    pub async fn run_until<F>(self, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.router()?;
        let addr = self.config.socket_address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;

        info!(
            address = %listener.local_addr()?,
            issuer = %self.authorizer.verifier().expected_issuer(),
            "Server listening"
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal, stopping server..."),
        Err(e) => warn!(error = %e, "Failed to install Ctrl+C handler"),
    }
}
