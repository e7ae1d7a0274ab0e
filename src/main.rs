//! indexsync
//!
//! HTTP service that keeps sqlite-vec embeddings and FTS5 mirrors in step
//! with SQLite-backed record collections.

use clap::Parser;
use tracing::warn;

use indexsync_config::{Config, ConfigLoader, ConfigValidator};

mod cli;
mod register;
mod server;

use cli::{Cli, Commands};
use server::{init_tracing, run_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::load_or_default(&cli.config)?;
    init_tracing(&config.logging)?;

    if !cli.config.exists() {
        warn!(
            "Config file {} not found, using defaults",
            cli.config.display()
        );
    }

    match cli.command {
        None => {
            validate(&config)?;
            run_server(config).await
        }
        Some(Commands::Run { host, port }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            validate(&config)?;
            run_server(config).await
        }
        Some(Commands::Check) => {
            validate(&config)?;
            println!("Configuration OK");
            Ok(())
        }
    }
}

/// Log warnings and fail on validation errors.
fn validate(config: &Config) -> anyhow::Result<()> {
    let result = ConfigValidator::validate(config)?;
    for warning in &result.warnings {
        warn!("config {}: {}", warning.path, warning.message);
    }
    if !result.is_valid() {
        let errors: Vec<String> = result
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.path, e.message))
            .collect();
        anyhow::bail!("invalid configuration:\n  {}", errors.join("\n  "));
    }
    Ok(())
}
