// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::types::ExitPolicy;

/// Command-line arguments for `publink`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "publink",
    version,
    about = "Run a publisher command, mirror its output and print the published URL.",
    long_about = None
)]
pub struct CliArgs {
    /// Program and arguments to run directly (no shell).
    ///
    /// If neither this nor `--shell` nor a config command is given,
    /// `./clo publish http 8080` is run through the shell.
    #[arg(value_name = "COMMAND", trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,

    /// Command string to run through the platform shell.
    #[arg(long, value_name = "STRING", conflicts_with = "command")]
    pub shell: Option<String>,

    /// Path to an optional config file (TOML).
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Regex whose first capture group is the URL.
    #[arg(long, value_name = "REGEX", conflicts_with = "separator")]
    pub pattern: Option<String>,

    /// Literal separator between the source and the URL (default " -> ").
    #[arg(long, value_name = "STR")]
    pub separator: Option<String>,

    /// Give up if no URL was seen within this long (e.g. "30s", "2m").
    #[arg(long, value_name = "DURATION")]
    pub timeout: Option<String>,

    /// What to do when the command exits before printing a URL.
    #[arg(long, value_enum, value_name = "POLICY")]
    pub on_exit_without_match: Option<ExitPolicy>,

    /// Stop the command as soon as the URL is known.
    #[arg(long)]
    pub exit_on_match: bool,

    /// Working directory for the command.
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<String>,

    /// Extra environment variable for the command (repeatable).
    #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub env: Vec<(String, String)>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PUBLINK_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the resolved command and pattern, but don't run anything.
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

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) if !k.is_empty() => Ok((k.to_string(), v.to_string())),
        _ => Err(format!("expected KEY=VALUE, got {s:?}")),
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
