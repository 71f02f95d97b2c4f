//! Server configuration management

use patisserie_auth::IdentityConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix for environment overrides, e.g. `PATISSERIE_PORT=9000` or
/// `PATISSERIE_AUTH__AUDIENCE=coffee`
pub const ENV_PREFIX: &str = "PATISSERIE";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub bind_address: String,
    /// Bind port
    pub port: u16,
    /// Identity provider settings
    pub auth: IdentityConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Seed the store with sample records at startup
    pub seed_sample_data: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (or any `EnvFilter` directive)
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub structured: bool,
    /// Directory for daily-rotated log files; stderr only when unset
    pub directory: Option<PathBuf>,
    /// Log file name prefix
    pub file_prefix: String,
}

/// CORS configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins; any origin when empty
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 5000,
            auth: IdentityConfig::default(),
            logging: LoggingConfig::default(),
            cors: CorsConfig::default(),
            seed_sample_data: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            structured: false,
            directory: None,
            file_prefix: "patisserie.log".to_string(),
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// Unsupported file format
    #[error("Unsupported configuration file format. Use .toml, .yaml, .yml, or .json")]
    UnsupportedFormat,

    /// Configuration parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] config::ConfigError),
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__") // Use __ for nested config (e.g., PATISSERIE_AUTH__DOMAIN)
        .list_separator(",")
        .with_list_parse_key("auth.algorithms")
        .with_list_parse_key("cors.allowed_origins")
        .try_parsing(true)
}

impl ServerConfig {
    /// Load configuration from a file (TOML, YAML, or JSON)
    ///
    /// The file format is auto-detected from the file extension. Environment
    /// variables with the `PATISSERIE_` prefix override file settings, and an
    /// identity domain or audience left empty falls back to `AUTH0_DOMAIN` /
    /// `API_AUDIENCE`.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use patisserie_server::ServerConfig;
    ///
    /// let config = ServerConfig::from_file("patisserie.toml").expect("Failed to load config");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file doesn't exist
    /// - The file format is unsupported
    /// - The file contains invalid configuration
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        use config::{Config, File, FileFormat};

        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let format = match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => FileFormat::Toml,
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("json") => FileFormat::Json,
            _ => return Err(ConfigError::UnsupportedFormat),
        };

        let config = Config::builder()
            .add_source(File::new(
                path.to_str().ok_or(ConfigError::UnsupportedFormat)?,
                format,
            ))
            // Environment variables override file settings (12-factor app pattern)
            .add_source(environment())
            .build()?;

        let mut loaded: Self = config.try_deserialize()?;
        loaded.auth = loaded.auth.with_env_fallback();
        Ok(loaded)
    }

    /// Load configuration from defaults and the environment only
    ///
    /// # Errors
    ///
    /// Returns an error if an environment override cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = config::Config::builder().add_source(environment()).build()?;
        let mut loaded: Self = config.try_deserialize()?;
        loaded.auth = loaded.auth.with_env_fallback();
        Ok(loaded)
    }

    /// Load from `path` when given, otherwise from the environment
    ///
    /// # Errors
    ///
    /// See [`ServerConfig::from_file`] and [`ServerConfig::from_env`].
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::from_env(),
        }
    }

    /// `bind_address:port`
    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Create a configuration builder
    ///
    /// # Example
    ///
    /// ```rust
    /// use patisserie_server::ServerConfig;
    ///
    /// let config = ServerConfig::builder()
    ///     .identity("tenant.auth0.com", "coffee")
    ///     .port(9000)
    ///     .build();
    /// assert_eq!(config.port, 9000);
    /// ```
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::new()
    }
}

/// Configuration builder
#[derive(Debug, Default)]
pub struct ConfigurationBuilder {
    /// Configuration being built
    config: ServerConfig,
}

impl ConfigurationBuilder {
    /// Create a new configuration builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bind address
    pub fn bind_address(mut self, address: impl Into<String>) -> Self {
        self.config.bind_address = address.into();
        self
    }

    /// Set port
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set identity provider domain and audience
    pub fn identity(mut self, domain: impl Into<String>, audience: impl Into<String>) -> Self {
        self.config.auth.domain = domain.into();
        self.config.auth.audience = audience.into();
        self
    }

    /// Replace the identity settings
    #[must_use]
    pub fn auth(mut self, auth: IdentityConfig) -> Self {
        self.config.auth = auth;
        self
    }

    /// Set log level
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    /// Restrict CORS to the given origins
    pub fn allowed_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.cors.allowed_origins = origins.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable sample data
    #[must_use]
    pub const fn seed_sample_data(mut self, seed: bool) -> Self {
        self.config.seed_sample_data = seed;
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> ServerConfig {
        self.config
    }
}
