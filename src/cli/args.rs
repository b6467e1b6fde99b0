//! CLI argument definitions using clap
//!
//! Commands:
//! - mobile-db-shim serve [--config <path>] [--port <port>] [--store <kind>] ...
//! - mobile-db-shim config [--config <path>]

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::http_server::StoreKind;

/// Serves a mobile backend's database API on top of a document store
#[derive(Parser, Debug)]
#[command(name = "mobile-db-shim")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server
    Serve {
        #[command(flatten)]
        overrides: ConfigArgs,
    },

    /// Print the effective configuration as JSON and exit
    Config {
        #[command(flatten)]
        overrides: ConfigArgs,
    },
}

/// Configuration file plus per-field overrides
#[derive(Args, Debug, Default, Clone)]
pub struct ConfigArgs {
    /// Path to configuration file (defaults apply when omitted)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(long)]
    pub port: Option<u16>,

    /// Backing store
    #[arg(long, value_enum)]
    pub store: Option<StoreKind>,

    /// Document store connection URL
    #[arg(long)]
    pub db_url: Option<String>,

    /// Database name
    #[arg(long)]
    pub db_name: Option<String>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
