// src/errors.rs

//! Crate-wide error type and `Result` alias.

use std::time::Duration;

use thiserror::Error;

use crate::monitor::MonitorState;
use crate::types::StreamKind;

#[derive(Error, Debug)]
pub enum PublinkError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("error reading {stream}: {source}")]
    StreamRead {
        stream: StreamKind,
        #[source]
        source: std::io::Error,
    },

    #[error("process exited without printing a matching line (exit code: {})", display_code(.exit_code))]
    NoMatch { exit_code: Option<i32> },

    #[error("no matching line within {0:?}")]
    Timeout(Duration),

    #[error("cancelled before a matching line was seen")]
    Cancelled,

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("monitor cannot run from state {0:?}")]
    InvalidState(MonitorState),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "none".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, PublinkError>;
