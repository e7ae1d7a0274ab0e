//! CLI definitions for indexsync.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// indexsync CLI.
#[derive(Parser)]
#[command(name = "indexsync")]
#[command(about = "Embedding and full-text index synchronization for record collections")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/indexsync.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the server in foreground (default)
    Run {
        /// Server host, overrides the config file
        #[arg(long)]
        host: Option<String>,

        /// Server port, overrides the config file
        #[arg(long)]
        port: Option<u16>,
    },

    /// Validate the configuration and exit
    Check,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
