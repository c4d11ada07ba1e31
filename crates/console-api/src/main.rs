//! `medinet-console`: serves the MediNet console API

use anyhow::Context;
use clap::Parser;
use medinet_console_api::{ConsoleConfig, ConsoleServer};
use medinet_infra_common::logging::setup::log_welcome;
use medinet_infra_common::setup_logging;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "MediNet hospital network console API", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "MEDINET_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overrides server.bind_address
    #[arg(short, long)]
    bind: Option<String>,

    /// SQLite URL for dispatch state, e.g. sqlite://medinet.db
    #[arg(short, long)]
    database: Option<String>,

    /// trace, debug, info, warn or error
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    fn apply(self, config: &mut ConsoleConfig) {
        if let Some(bind) = self.bind {
            config.server.bind_address = bind;
        }
        if let Some(url) = self.database {
            config.database.url = Some(url);
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if self.json_logs {
            config.logging.json = true;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = ConsoleConfig::load(args.config.as_deref()).context("loading configuration")?;
    args.apply(&mut config);
    config.validate().context("validating configuration")?;

    setup_logging(config.logging_config()?).context("installing log subscriber")?;
    log_welcome("medinet-console", env!("CARGO_PKG_VERSION"));

    let mut server = ConsoleServer::new(config)
        .await
        .context("building console state")?;
    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;
    Ok(())
}
