// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod logging;
pub mod monitor;
pub mod pattern;
pub mod types;

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{load_and_validate, parse_duration, ConfigFile};
use crate::errors::{PublinkError, Result};
use crate::monitor::ProcessMonitor;
use crate::pattern::PatternRule;
use crate::types::{ExitPolicy, Invocation};

/// Command run when nothing else is configured: the CloudPub client
/// publishing local port 8080.
pub const DEFAULT_COMMAND: &str = "./clo publish http 8080";

/// Everything `run` needs, after merging CLI flags, the config file and the
/// built-in defaults (in that order of precedence).
#[derive(Debug, Clone)]
pub struct Settings {
    pub invocation: Invocation,
    pub rule: PatternRule,
    pub timeout: Option<Duration>,
    pub exit_policy: ExitPolicy,
    pub exit_on_match: bool,
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - the process monitor
/// - Ctrl-C handling
///
/// Returns the exit code the binary should use: `0` normally, or the
/// publisher's own non-zero exit code if it failed after publishing.
pub async fn run(args: CliArgs) -> Result<i32> {
    let cfg = match &args.config {
        Some(path) => load_and_validate(PathBuf::from(path))?,
        None => ConfigFile::default(),
    };
    let settings = resolve_settings(&args, cfg)?;

    if args.dry_run {
        print_dry_run(&settings);
        return Ok(0);
    }

    // Ctrl-C → cancel the monitor (kills the publisher).
    let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        let _ = cancel_tx.send(());
    });

    let mut monitor = ProcessMonitor::new(settings.invocation, settings.rule)
        .with_timeout(settings.timeout)
        .with_exit_policy(settings.exit_policy)
        .with_cancel(cancel_rx);

    let url = monitor.run().await?;
    info!(cmd = %monitor.invocation().command, pid = ?monitor.pid(), %url, "publisher reported its URL");
    println!("Published URL: {url}");

    if settings.exit_on_match {
        monitor.shutdown().await;
        return Ok(0);
    }

    info!("URL published; mirroring output until the publisher exits (Ctrl+C to stop)");
    match monitor.wait().await {
        Ok(Some(code)) if code != 0 => Ok(code),
        Ok(_) => Ok(0),
        Err(PublinkError::Cancelled) => {
            info!("stopped by Ctrl+C");
            Ok(0)
        }
        Err(e) => Err(e),
    }
}

/// Merge CLI flags over the config file over the defaults.
pub fn resolve_settings(args: &CliArgs, cfg: ConfigFile) -> Result<Settings> {
    let mut invocation = if !args.command.is_empty() {
        Invocation::argv(args.command.iter().cloned())
    } else if let Some(shell) = &args.shell {
        Invocation::shell(shell.clone())
    } else if let Some(inv) = cfg.invocation {
        inv
    } else {
        debug!(cmd = DEFAULT_COMMAND, "no command configured; using default");
        Invocation::shell(DEFAULT_COMMAND)
    };

    if let Some(cwd) = &args.cwd {
        invocation.cwd = Some(PathBuf::from(cwd));
    }
    for (key, value) in &args.env {
        invocation.env.insert(key.clone(), value.clone());
    }

    let rule = match (&args.pattern, &args.separator) {
        (Some(re), _) => PatternRule::from_regex(re)?,
        (None, Some(sep)) => PatternRule::with_separator(sep)?,
        (None, None) => cfg.pattern.unwrap_or_default(),
    };

    let timeout = match &args.timeout {
        Some(s) => Some(parse_duration(s)?),
        None => cfg.timeout,
    };

    Ok(Settings {
        invocation,
        rule,
        timeout,
        exit_policy: args.on_exit_without_match.unwrap_or(cfg.exit_policy),
        exit_on_match: args.exit_on_match || cfg.exit_on_match,
    })
}

/// Simple dry-run output: print the resolved settings.
fn print_dry_run(settings: &Settings) {
    println!("publink dry-run");
    println!("  command: {:?}", settings.invocation.command);
    if let Some(cwd) = &settings.invocation.cwd {
        println!("  cwd: {}", cwd.display());
    }
    for (key, value) in &settings.invocation.env {
        println!("  env: {key}={value}");
    }
    println!("  pattern: {}", settings.rule.as_str());
    match settings.timeout {
        Some(t) => println!("  timeout: {t:?}"),
        None => println!("  timeout: none"),
    }
    println!("  on_exit_without_match: {:?}", settings.exit_policy);
    println!("  exit_on_match: {}", settings.exit_on_match);

    debug!("dry-run complete (no execution)");
}
