//! Shared helpers for command handlers.

use std::io::{self, IsTerminal};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::error::CliError;

/// Spinner on stderr while a long step runs. `None` when quiet or when
/// stderr is not a terminal, so piped output stays clean.
pub fn spinner(message: impl Into<String>, quiet: bool) -> Option<ProgressBar> {
    if quiet || !io::stderr().is_terminal() {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.cyan} {msg} {elapsed:.dim}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(120));
    Some(pb)
}

/// Map a dialoguer / interactive I/O failure into `CliError`.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// `1. first`, `2. second`, ... indented for detail views.
pub fn numbered(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| format!("  {}. {line}", i + 1))
        .collect()
}

/// Parse a `key = value` setting, naming the key on failure.
pub fn parse_setting<T: std::str::FromStr>(
    key: &str,
    value: &str,
    expected: &str,
) -> Result<T, CliError> {
    value.trim().parse().map_err(|_| CliError::Validation {
        field: key.to_owned(),
        reason: format!("expected {expected}, got '{value}'"),
    })
}

/// Split a comma-separated list, dropping empty items.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn settings_report_the_key() {
        let err = parse_setting::<u32>("max_attempts", "many", "a number").unwrap_err();
        assert!(err.to_string().contains("max_attempts"));
        assert_eq!(parse_setting::<u32>("max_attempts", " 4 ", "a number").ok(), Some(4));
    }

    #[test]
    fn lists_are_trimmed() {
        assert_eq!(split_list("Bose, ,Jabra ,"), vec!["Bose", "Jabra"]);
    }

    #[test]
    fn numbering_starts_at_one() {
        assert_eq!(numbered(&["a".into(), "b".into()]), vec!["  1. a", "  2. b"]);
    }
}
