//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use stereofix_core::{ConnectionState, StrategyStatus};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Connection state label, green for stereo and yellow for the call profile.
pub fn state_label(state: ConnectionState, color: bool) -> String {
    let label = state.to_string();
    if !color {
        return label;
    }
    match state {
        ConnectionState::ConnectedHighQuality => label.green().bold().to_string(),
        ConnectionState::ConnectedLowQuality => label.yellow().bold().to_string(),
        ConnectionState::Connected => label.cyan().to_string(),
        ConnectionState::Disconnected => label.red().to_string(),
        ConnectionState::Unknown => label.dimmed().to_string(),
    }
}

pub fn strategy_label(status: StrategyStatus, color: bool) -> String {
    let label = status.to_string();
    if !color {
        return label;
    }
    match status {
        StrategyStatus::Succeeded => label.green().to_string(),
        StrategyStatus::Failed => label.red().to_string(),
        StrategyStatus::Guidance => label.yellow().to_string(),
        StrategyStatus::Unavailable | StrategyStatus::Skipped => label.dimmed().to_string(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the original data via serde
/// - `yaml`: serializes via `serde_yaml`
/// - `plain`: calls `id_fn` on each item to emit one identifier per line
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(data)?),
        OutputFormat::JsonCompact => Ok(serde_json::to_string(data)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(data)?),
        OutputFormat::Plain => Ok(data.iter().map(&id_fn).collect::<Vec<_>>().join("\n")),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, since single-item detail views
/// don't use the `Tabled` derive.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(data)?),
        OutputFormat::JsonCompact => Ok(serde_json::to_string(data)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(data)?),
        OutputFormat::Plain => Ok(id_fn(data)),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[derive(serde::Serialize, Tabled)]
    struct Row {
        name: String,
        address: String,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row {
                name: "WH-1000XM4".into(),
                address: "AA:BB:CC:DD:EE:FF".into(),
            },
            Row {
                name: "AirPods Pro".into(),
                address: "11:22:33:44:55:66".into(),
            },
        ]
    }

    fn to_row(r: &Row) -> Row {
        Row {
            name: r.name.clone(),
            address: r.address.clone(),
        }
    }

    #[test]
    fn plain_lists_one_identifier_per_line() {
        let out = render_list(OutputFormat::Plain, &rows(), to_row, |r| r.address.clone()).unwrap();
        assert_eq!(out, "AA:BB:CC:DD:EE:FF\n11:22:33:44:55:66");
    }

    #[test]
    fn compact_json_is_a_single_line() {
        let out = render_list(OutputFormat::JsonCompact, &rows(), to_row, |r| r.name.clone())
            .unwrap();
        assert!(!out.contains('\n'));
        assert!(out.starts_with("[{\"name\":\"WH-1000XM4\""));
    }

    #[test]
    fn table_has_headers() {
        let out = render_list(OutputFormat::Table, &rows(), to_row, |r| r.name.clone()).unwrap();
        assert!(out.contains("name"));
        assert!(out.contains("AirPods Pro"));
    }

    #[test]
    fn labels_are_plain_without_color() {
        assert_eq!(
            state_label(ConnectionState::ConnectedLowQuality, false),
            ConnectionState::ConnectedLowQuality.to_string()
        );
        assert_ne!(
            state_label(ConnectionState::ConnectedHighQuality, true),
            ConnectionState::ConnectedHighQuality.to_string()
        );
    }
}
