//! Logging initialization
//!
//! Logs always go to stderr. When [`LoggingConfig::directory`] is set they are
//! also written to a daily-rotated file, and the returned guard must be held
//! for the life of the process so buffered lines are flushed.
//!
//! ```rust,no_run
//! use patisserie_server::LoggingConfig;
//!
//! let _guard = LoggingConfig::default().init()?;
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! `RUST_LOG` takes precedence over the configured level.

use crate::config::LoggingConfig;
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Guard that ensures file logs are flushed on drop
#[derive(Debug)]
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

impl LoggingConfig {
    /// Initialize logging based on this configuration
    ///
    /// Returns `Some(LoggingGuard)` when file output is enabled (must be held),
    /// or `None` for stderr-only logging.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The log directory cannot be created
    /// - A global subscriber is already installed
    pub fn init(&self) -> io::Result<Option<LoggingGuard>> {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        match &self.directory {
            None => {
                init_stderr(self, filter)?;
                Ok(None)
            }
            Some(dir) => init_stderr_and_file(self, dir, filter).map(Some),
        }
    }
}

/// Initialize stderr-only logging (no guard needed)
fn init_stderr(config: &LoggingConfig, filter: EnvFilter) -> io::Result<()> {
    let subscriber = tracing_subscriber::registry().with(filter);

    if config.structured {
        subscriber
            .with(fmt::layer().json().with_writer(io::stderr))
            .try_init()
            .map_err(|e| io::Error::other(e.to_string()))
    } else {
        subscriber
            .with(fmt::layer().with_writer(io::stderr))
            .try_init()
            .map_err(|e| io::Error::other(e.to_string()))
    }
}

/// Initialize stderr + rolling file logging (returns guard)
fn init_stderr_and_file(
    config: &LoggingConfig,
    dir: &Path,
    filter: EnvFilter,
) -> io::Result<LoggingGuard> {
    std::fs::create_dir_all(dir)?;

    let file_appender = tracing_appender::rolling::daily(dir, &config.file_prefix);
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.structured {
        subscriber
            .with(fmt::layer().json().with_writer(io::stderr))
            .with(fmt::layer().json().with_ansi(false).with_writer(file_writer))
            .try_init()
            .map_err(|e| io::Error::other(e.to_string()))?;
    } else {
        subscriber
            .with(fmt::layer().with_writer(io::stderr))
            .with(fmt::layer().with_ansi(false).with_writer(file_writer))
            .try_init()
            .map_err(|e| io::Error::other(e.to_string()))?;
    }

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}
