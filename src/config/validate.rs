// src/config/validate.rs

use crate::config::duration::parse_duration;
use crate::config::model::{CommandSection, ConfigFile, PatternSection, RawConfigFile};
use crate::errors::{PublinkError, Result};
use crate::pattern::PatternRule;
use crate::types::{CommandLine, Invocation};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = PublinkError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let invocation = build_invocation(raw.command)?;
        let pattern = build_pattern(&raw.pattern)?;
        let timeout = raw
            .monitor
            .timeout
            .as_deref()
            .map(parse_duration)
            .transpose()?;

        Ok(ConfigFile {
            invocation,
            pattern,
            timeout,
            exit_policy: raw.monitor.on_exit_without_match,
            exit_on_match: raw.monitor.exit_on_match,
        })
    }
}

fn build_invocation(section: CommandSection) -> Result<Option<Invocation>> {
    let command = match (section.shell, section.argv) {
        (Some(_), Some(_)) => {
            return Err(PublinkError::ConfigError(
                "[command] may set `shell` or `argv`, not both".to_string(),
            ));
        }
        (Some(shell), None) => {
            if shell.trim().is_empty() {
                return Err(PublinkError::ConfigError(
                    "[command].shell must not be empty".to_string(),
                ));
            }
            CommandLine::Shell(shell)
        }
        (None, Some(argv)) => {
            if argv.first().is_none_or(|p| p.is_empty()) {
                return Err(PublinkError::ConfigError(
                    "[command].argv must start with a program name".to_string(),
                ));
            }
            CommandLine::Argv(argv)
        }
        (None, None) => {
            if section.cwd.is_some() || !section.env.is_empty() {
                return Err(PublinkError::ConfigError(
                    "[command].cwd/env given without `shell` or `argv`".to_string(),
                ));
            }
            return Ok(None);
        }
    };

    Ok(Some(Invocation {
        command,
        cwd: section.cwd,
        env: section.env,
    }))
}

fn build_pattern(section: &PatternSection) -> Result<Option<PatternRule>> {
    match (&section.separator, &section.regex) {
        (Some(_), Some(_)) => Err(PublinkError::ConfigError(
            "[pattern] may set `separator` or `regex`, not both".to_string(),
        )),
        (Some(sep), None) => PatternRule::with_separator(sep).map(Some),
        (None, Some(re)) => PatternRule::from_regex(re).map(Some),
        (None, None) => Ok(None),
    }
}
