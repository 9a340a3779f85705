// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::pattern::PatternRule;
use crate::types::{ExitPolicy, Invocation};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [command]
/// shell = "./clo publish http 8080"
///
/// [pattern]
/// separator = " -> "
///
/// [monitor]
/// timeout = "30s"
/// on_exit_without_match = "fail"
/// ```
///
/// All sections are optional. This is the unvalidated form; convert it into a
/// [`ConfigFile`] with `ConfigFile::try_from`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub command: CommandSection,

    #[serde(default)]
    pub pattern: PatternSection,

    #[serde(default)]
    pub monitor: MonitorSection,
}

/// `[command]` section. `shell` and `argv` are mutually exclusive.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandSection {
    /// Command string run through the platform shell.
    #[serde(default)]
    pub shell: Option<String>,

    /// Program and arguments, run without a shell.
    #[serde(default)]
    pub argv: Option<Vec<String>>,

    /// Working directory for the child.
    #[serde(default)]
    pub cwd: Option<PathBuf>,

    /// Extra environment variables for the child.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// `[pattern]` section. `separator` and `regex` are mutually exclusive; when
/// both are absent the default ` -> ` rule applies.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternSection {
    #[serde(default)]
    pub separator: Option<String>,

    /// Regex with at least one capture group; group 1 is the URL.
    #[serde(default)]
    pub regex: Option<String>,
}

/// `[monitor]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorSection {
    /// Duration string (e.g. `"30s"`); no timeout when absent.
    #[serde(default)]
    pub timeout: Option<String>,

    #[serde(default)]
    pub on_exit_without_match: ExitPolicy,

    /// Kill the child as soon as the URL is known.
    #[serde(default)]
    pub exit_on_match: bool,
}

/// Validated configuration.
///
/// `invocation` is `None` when the file does not name a command; the caller
/// then falls back to the CLI or the built-in default.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub invocation: Option<Invocation>,
    pub pattern: Option<PatternRule>,
    pub timeout: Option<Duration>,
    pub exit_policy: ExitPolicy,
    pub exit_on_match: bool,
}
