// src/pattern.rs

//! Extraction of the published URL from a single stdout line.
//!
//! A [`PatternRule`] is a compiled regex whose first capture group is the
//! extracted value. The default rule is `.+ -> (.+)`: at least one character,
//! the literal ` -> `, then the value. Because the leading `.+` is greedy the
//! *last* separator on a line wins, so `a -> b -> c` yields `c`.
//!
//! Lines arrive with their trailing `\n` / `\r\n` already removed; nothing
//! else is trimmed from the capture.

use std::fmt;

use regex::Regex;

use crate::errors::{PublinkError, Result};

/// Separator printed by `clo publish` between the local address and the
/// public URL.
pub const DEFAULT_SEPARATOR: &str = " -> ";

#[derive(Clone)]
pub struct PatternRule {
    regex: Regex,
}

impl PatternRule {
    /// Rule matching `<something><separator><value>`.
    pub fn with_separator(separator: &str) -> Result<Self> {
        if separator.is_empty() {
            return Err(PublinkError::InvalidPattern(
                "separator must not be empty".to_string(),
            ));
        }
        Self::from_regex(&format!(".+{}(.+)", regex::escape(separator)))
    }

    /// Rule from a user-supplied regex. Capture group 1 is the value.
    pub fn from_regex(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| PublinkError::InvalidPattern(format!("{pattern:?}: {e}")))?;

        // captures_len() counts the implicit whole-match group 0.
        if regex.captures_len() < 2 {
            return Err(PublinkError::InvalidPattern(format!(
                "{pattern:?} has no capture group for the extracted value"
            )));
        }

        Ok(Self { regex })
    }

    /// Value captured from `line`, or `None` if the line does not match.
    pub fn extract<'l>(&self, line: &'l str) -> Option<&'l str> {
        self.regex
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl Default for PatternRule {
    fn default() -> Self {
        Self {
            regex: Regex::new(r".+ -> (.+)").expect("default pattern is valid"),
        }
    }
}

impl fmt::Debug for PatternRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PatternRule").field(&self.regex.as_str()).finish()
    }
}
