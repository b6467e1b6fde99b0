//! CLI module for the database shim
//!
//! Provides command-line interface for:
//! - serve: Start the HTTP server
//! - config: Print the effective configuration

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command, ConfigArgs};
pub use commands::{resolve_config, run, run_command, serve, show_config};
pub use errors::{CliError, CliErrorCode, CliResult};
