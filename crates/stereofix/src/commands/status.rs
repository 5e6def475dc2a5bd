//! `status` command: probe a headset without changing anything.

use tabled::Tabled;

use stereofix_core::{Orchestrator, ProbeResult, StatusReport};

use crate::cli::{GlobalOpts, StatusArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ProbeRow {
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Judgment")]
    judgment: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Output")]
    raw: String,
}

impl From<&ProbeResult> for ProbeRow {
    fn from(p: &ProbeResult) -> Self {
        Self {
            source: p.source.to_string(),
            judgment: p
                .judgment
                .map_or_else(|| "-".into(), |s| s.to_string()),
            confidence: p.confidence.to_string(),
            raw: first_line(&p.raw),
        }
    }
}

fn first_line(raw: &str) -> String {
    let line = raw.trim().lines().next().unwrap_or_default();
    if line.chars().count() > 60 {
        let cut: String = line.chars().take(57).collect();
        format!("{cut}...")
    } else {
        line.to_owned()
    }
}

pub async fn handle(args: StatusArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let rc = config::recovery_config(global)?;
    let orchestrator = Orchestrator::new(rc)?;

    // Explicit address > profile address > auto-detection.
    let report = match args.address {
        Some(ref address) => orchestrator.probe_status(address).await?,
        None => {
            let identity = orchestrator.resolve_target().await?;
            orchestrator.status_of(&identity).await
        }
    };

    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        &report,
        |r| detail(r, color, args.detailed),
        |r| r.state.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn detail(r: &StatusReport, color: bool, detailed: bool) -> String {
    let mut lines = vec![
        format!("Device:  {}", r.device.label()),
        format!("State:   {}", output::state_label(r.state, color)),
    ];
    if let Some(format) = r.address_format {
        lines.push(format!("Format:  {format}"));
    }
    if detailed && !r.probes.is_empty() {
        let rows: Vec<ProbeRow> = r.probes.iter().map(ProbeRow::from).collect();
        lines.push(
            tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string(),
        );
    }
    lines.join("\n")
}
