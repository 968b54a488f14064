// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `rosterboard`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "rosterboard",
    version,
    about = "Republish group membership rosters to chat channels when they change.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value = "Rosterboard.toml")]
    pub config: String,

    /// Refresh every out-of-date category once, wait for the work to
    /// finish, then exit instead of listening for changes.
    #[arg(long)]
    pub once: bool,

    /// Publish a single change notification (a group id or `*`) and exit.
    #[arg(long, value_name = "GROUP")]
    pub notify: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ROSTERBOARD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print categories, but don't connect to anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
