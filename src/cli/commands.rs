//! CLI command implementations

use tracing_subscriber::EnvFilter;

use crate::http_server::{ShimConfig, ShimServer};

use super::args::{Command, ConfigArgs};
use super::errors::{CliError, CliResult};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { overrides } => serve(&overrides),
        Command::Config { overrides } => show_config(&overrides),
    }
}

/// Resolve the effective configuration: file (or defaults), then flags
pub fn resolve_config(args: &ConfigArgs) -> CliResult<ShimConfig> {
    let mut config = match &args.config {
        Some(path) => ShimConfig::load(path)?,
        None => ShimConfig::default(),
    };

    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(store) = args.store {
        config.store = store;
    }
    if let Some(url) = &args.db_url {
        config.db_url = url.clone();
    }
    if let Some(name) = &args.db_name {
        config.db_name = name.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Print the effective configuration
pub fn show_config(args: &ConfigArgs) -> CliResult<()> {
    let config = resolve_config(args)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// Start the HTTP server and block until shutdown
pub fn serve(args: &ConfigArgs) -> CliResult<()> {
    init_logging();

    let config = resolve_config(args)?;
    let server = ShimServer::with_config(config)?;

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::serve_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::serve_failed(format!("HTTP server failed: {}", e)))
    })?;

    Ok(())
}

/// Install the global subscriber; `RUST_LOG` overrides the `info` default
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
