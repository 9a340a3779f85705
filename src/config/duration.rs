// src/config/duration.rs

use std::time::Duration;

use crate::errors::{PublinkError, Result};

/// Parse a duration string like `"250ms"`, `"30s"`, `"5m"` or `"1h"`.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return Err(invalid(s, "empty duration string"));
    }

    // Boundary between digits and unit suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| invalid(s, "missing unit suffix"))?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| invalid(s, &format!("bad number '{num_part}': {e}")))?;

    match unit_part.trim().to_lowercase().as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => secs_times(s, value, 60),
        "h" => secs_times(s, value, 60 * 60),
        unit => Err(invalid(
            s,
            &format!("unsupported unit '{unit}'; expected ms, s, m, or h"),
        )),
    }
}

fn secs_times(input: &str, value: u64, factor: u64) -> Result<Duration> {
    value
        .checked_mul(factor)
        .map(Duration::from_secs)
        .ok_or_else(|| invalid(input, "duration too large"))
}

fn invalid(input: &str, why: &str) -> PublinkError {
    PublinkError::ConfigError(format!("invalid duration {input:?}: {why}"))
}
