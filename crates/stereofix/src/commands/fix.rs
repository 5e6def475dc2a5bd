//! `fix` command: run the recovery sequence and report what happened.

use tokio_util::sync::CancellationToken;

use stereofix_core::{FailureReason, Orchestrator, RecoveryAttempt, RecoveryReport};

use crate::cli::{FixArgs, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(
    args: FixArgs,
    global: &GlobalOpts,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    let rc = config::fix_config(global, &args)?;
    let orchestrator = Orchestrator::new(rc)?;

    let message = if args.dry_run {
        "Walking the recovery sequence (dry run)"
    } else {
        "Restoring stereo audio"
    };
    let spinner = util::spinner(message, global.quiet);
    let result = orchestrator.run_recovery(cancel).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let report = result?;

    let color = output::should_color(global.color);
    let verbose = global.verbose > 0;
    let out = output::render_single(
        global.output,
        &report,
        |r| detail(r, color, verbose),
        |r| r.final_state.to_string(),
    )?;
    output::print_output(&out, global.quiet);

    outcome(&report, cancel)
}

/// Translate the report into the process result.
fn outcome(report: &RecoveryReport, cancel: &CancellationToken) -> Result<(), CliError> {
    if cancel.is_cancelled() && !report.success {
        return Err(CliError::Interrupted);
    }
    if report.success || report.dry_run {
        return Ok(());
    }
    let not_connected = report
        .attempts
        .last()
        .and_then(|a| a.failure.as_ref())
        .is_some_and(|f| matches!(f, FailureReason::NotConnected { .. }));
    if not_connected {
        return Err(CliError::NotConnected {
            device: report.device.label(),
        });
    }
    Err(CliError::RecoveryFailed {
        reason: report
            .reason
            .clone()
            .unwrap_or_else(|| "stereo profile not restored".into()),
        guidance: util::numbered(&report.guidance).join("\n"),
    })
}

// ── Detail view ─────────────────────────────────────────────────────

fn detail(r: &RecoveryReport, color: bool, verbose: bool) -> String {
    let mut device = r.device.label();
    if r.device.auto_detected {
        device.push_str(" [auto-detected]");
    }

    let result = match (r.success, r.method_used) {
        (true, Some(method)) => format!("restored ({method})"),
        _ if r.dry_run => "dry run, nothing changed".to_owned(),
        _ => "not restored".to_owned(),
    };

    let mut lines = vec![
        format!("Device:    {device}"),
        format!("Result:    {result}"),
        format!("State:     {}", output::state_label(r.final_state, color)),
        format!("Attempts:  {}", r.attempts_used),
    ];
    lines.extend(r.attempts.iter().map(attempt_line));

    if !r.fallbacks.is_empty() {
        lines.push("Fallbacks:".into());
        for f in &r.fallbacks {
            lines.push(format!(
                "  {:<15} {:<12} {}",
                f.kind.to_string(),
                output::strategy_label(f.status, color),
                f.detail
            ));
        }
    }

    if verbose && !r.diagnostics.is_empty() {
        lines.push("Diagnostics:".into());
        lines.extend(r.diagnostics.iter().map(|d| format!("  {d}")));
    }
    lines.join("\n")
}

fn attempt_line(a: &RecoveryAttempt) -> String {
    let phases = a
        .phases()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" → ");
    match &a.failure {
        Some(reason) => format!("  #{} {}: {reason}\n     {phases}", a.number, a.outcome),
        None => format!("  #{} {}\n     {phases}", a.number, a.outcome),
    }
}
