use anyhow::Context;
use clap::Parser;
use patisserie_server::{Server, ServerConfig};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "patisserie-server",
    version,
    about = "Drinks and cakes API guarded by bearer-token permissions",
    long_about = "Serves the drinks and cakes API.\n\n\
                  Settings are read from defaults, then the optional config file, then\n\
                  PATISSERIE_* environment variables (e.g. PATISSERIE_AUTH__DOMAIN).\n\
                  AUTH0_DOMAIN, API_AUDIENCE and ALGORITHMS are honoured when the\n\
                  identity settings are otherwise unset."
)]
struct Cli {
    /// Configuration file (.toml, .yaml, .yml or .json)
    #[arg(long, short = 'c', env = "PATISSERIE_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, short = 'b')]
    bind: Option<String>,

    /// Port to listen on
    #[arg(long, short = 'p')]
    port: Option<u16>,

    /// Log level filter (overridden by RUST_LOG)
    #[arg(long, short = 'l')]
    log_level: Option<String>,
}

impl Cli {
    fn apply(&self, config: &mut ServerConfig) {
        if let Some(bind) = &self.bind {
            config.bind_address.clone_from(bind);
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(level) = &self.log_level {
            config.logging.level.clone_from(level);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config =
        ServerConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    cli.apply(&mut config);

    let _guard = config
        .logging
        .init()
        .context("failed to initialize logging")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        domain = %config.auth.domain,
        audience = %config.auth.audience,
        "Starting patisserie-server"
    );

    Server::from_config(config)
        .await
        .context("failed to start server")?
        .run()
        .await?;

    Ok(())
}
