#![allow(clippy::unwrap_used)]
// Fallback selection: preconditions, smart vs exhaustive, dry run.

mod support;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

use stereofix_core::{
    ActionExecutor, CommandOutput, CommandRunner, DeviceIdentity, FallbackMode, FallbackOutcome,
    FallbackSelector, FormatCache, PhaseDurations, StatusProber, StrategyKind, StrategyStatus,
    ToolPaths,
};
use support::{ADDRESS, NAME, ScriptedRunner, inventory_high, inventory_low};

const OUTPUTS: &str = "MacBook Pro Speakers (output)\nWH-1000XM4 (output)\n";

async fn run_fallbacks(
    runner: &Arc<ScriptedRunner>,
    mode: FallbackMode,
    dry_run: bool,
    identity: &DeviceIdentity,
) -> FallbackOutcome {
    let dyn_runner: Arc<dyn CommandRunner> = Arc::clone(runner) as Arc<dyn CommandRunner>;
    let tools = ToolPaths::default();
    let durations = PhaseDurations::default();
    let formats = Arc::new(FormatCache::new());
    let prober = StatusProber::new(
        Arc::clone(&dyn_runner),
        tools.clone(),
        durations.command_timeout,
        Arc::clone(&formats),
    );
    let executor = ActionExecutor::new(
        Arc::clone(&dyn_runner),
        tools.control.clone(),
        durations.command_timeout,
        formats,
        dry_run,
    );
    let selector = FallbackSelector::new(
        dyn_runner, &prober, &executor, &tools, &durations, mode, dry_run,
    );
    selector.run(identity, &CancellationToken::new()).await
}

fn named() -> DeviceIdentity {
    DeviceIdentity::configured(ADDRESS.parse().unwrap(), Some(NAME.into()))
}

fn unnamed() -> DeviceIdentity {
    DeviceIdentity::configured(ADDRESS.parse().unwrap(), None)
}

fn statuses(outcome: &FallbackOutcome) -> Vec<(StrategyKind, StrategyStatus)> {
    outcome.reports.iter().map(|r| (r.kind, r.status)).collect()
}

/// Audio cycling that completes but leaves the headset on the call profile.
fn failing_audio_cycle(runner: ScriptedRunner) -> ScriptedRunner {
    runner
        .respond("SwitchAudioSource -a -t output", CommandOutput::ok(OUTPUTS))
        .respond(
            "SwitchAudioSource -s MacBook Pro Speakers -t output",
            CommandOutput::ok(""),
        )
        .respond(&format!("SwitchAudioSource -s {NAME} -t output"), CommandOutput::ok(""))
}

fn working_alternate_tool(runner: ScriptedRunner) -> ScriptedRunner {
    runner
        .respond("BluetoothConnector --disconnect aa-bb-cc-dd-ee-ff", CommandOutput::ok(""))
        .respond("BluetoothConnector --connect aa-bb-cc-dd-ee-ff", CommandOutput::ok(""))
        .after(
            "BluetoothConnector --connect aa-bb-cc-dd-ee-ff",
            "system_profiler SPBluetoothDataType",
            inventory_high(),
        )
}

#[tokio::test(start_paused = true)]
async fn smart_mode_skips_strategies_whose_precondition_fails() {
    // Audio cycling needs the device name, which is unknown here.
    let runner = working_alternate_tool(
        ScriptedRunner::new(&["system_profiler", "SwitchAudioSource", "BluetoothConnector"])
            .respond("system_profiler SPBluetoothDataType", inventory_low()),
    )
    .into_arc();

    let outcome = run_fallbacks(&runner, FallbackMode::Smart, false, &unnamed()).await;

    assert_eq!(
        statuses(&outcome),
        vec![
            (StrategyKind::AudioCycle, StrategyStatus::Unavailable),
            (StrategyKind::AlternateTool, StrategyStatus::Succeeded),
        ]
    );
    assert_eq!(outcome.succeeded_with, Some(StrategyKind::AlternateTool));
    assert_eq!(outcome.reports[0].detail, "device name unknown");
    assert!(runner.calls().iter().all(|c| !c.starts_with("SwitchAudioSource")));
}

#[tokio::test(start_paused = true)]
async fn smart_mode_runs_only_the_least_invasive_strategy() {
    let runner = working_alternate_tool(failing_audio_cycle(
        ScriptedRunner::new(&["system_profiler", "SwitchAudioSource", "BluetoothConnector"])
            .respond("system_profiler SPBluetoothDataType", inventory_low()),
    ))
    .into_arc();

    let outcome = run_fallbacks(&runner, FallbackMode::Smart, false, &named()).await;

    assert_eq!(
        statuses(&outcome),
        vec![(StrategyKind::AudioCycle, StrategyStatus::Failed)]
    );
    assert!(!outcome.succeeded());
    assert!(outcome.guidance.is_empty());
    assert!(runner.calls().iter().all(|c| !c.starts_with("BluetoothConnector")));
}

#[tokio::test(start_paused = true)]
async fn exhaustive_mode_follows_priority_until_success() {
    let runner = working_alternate_tool(failing_audio_cycle(
        ScriptedRunner::new(&[
            "system_profiler",
            "SwitchAudioSource",
            "BluetoothConnector",
            "osascript",
        ])
        .respond("system_profiler SPBluetoothDataType", inventory_low()),
    ))
    .into_arc();

    let outcome = run_fallbacks(&runner, FallbackMode::Exhaustive, false, &named()).await;

    assert_eq!(
        statuses(&outcome),
        vec![
            (StrategyKind::AudioCycle, StrategyStatus::Failed),
            (StrategyKind::AlternateTool, StrategyStatus::Succeeded),
        ]
    );
    assert_eq!(
        runner.mutations(),
        vec![
            "SwitchAudioSource -s MacBook Pro Speakers -t output".to_owned(),
            format!("SwitchAudioSource -s {NAME} -t output"),
            "BluetoothConnector --disconnect aa-bb-cc-dd-ee-ff".to_owned(),
            "BluetoothConnector --connect aa-bb-cc-dd-ee-ff".to_owned(),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn exhaustive_mode_ends_with_manual_guidance() {
    let runner = failing_audio_cycle(
        ScriptedRunner::new(&["system_profiler", "SwitchAudioSource"])
            .respond("system_profiler SPBluetoothDataType", inventory_low()),
    )
    .into_arc();

    let outcome = run_fallbacks(&runner, FallbackMode::Exhaustive, false, &named()).await;

    assert_eq!(
        statuses(&outcome),
        vec![
            (StrategyKind::AudioCycle, StrategyStatus::Failed),
            (StrategyKind::AlternateTool, StrategyStatus::Unavailable),
            (StrategyKind::GuiToggle, StrategyStatus::Unavailable),
            (StrategyKind::DaemonRestart, StrategyStatus::Unavailable),
            (StrategyKind::Manual, StrategyStatus::Guidance),
        ]
    );
    assert!(!outcome.succeeded());
    assert_eq!(outcome.guidance.len(), 5);
}

#[tokio::test(start_paused = true)]
async fn daemon_restart_requires_root() {
    let runner = ScriptedRunner::new(&["system_profiler", "pkill", "id"])
        .respond("system_profiler SPBluetoothDataType", inventory_low())
        .respond("id -u", CommandOutput::ok("501\n"))
        .into_arc();

    let outcome = run_fallbacks(&runner, FallbackMode::Smart, false, &named()).await;

    let restart = outcome
        .reports
        .iter()
        .find(|r| r.kind == StrategyKind::DaemonRestart)
        .unwrap();
    assert_eq!(restart.status, StrategyStatus::Unavailable);
    assert_eq!(restart.detail, "requires root privileges");
    assert_eq!(runner.count("pkill bluetoothd"), 0);
}

#[tokio::test(start_paused = true)]
async fn daemon_restart_reconnects_as_root() {
    let runner = ScriptedRunner::new(&["system_profiler", "pkill", "id", "blueutil"])
        .respond("system_profiler SPBluetoothDataType", inventory_low())
        .respond("id -u", CommandOutput::ok("0\n"))
        .respond("pkill bluetoothd", CommandOutput::ok(""))
        .respond("blueutil --connect AA:BB:CC:DD:EE:FF", CommandOutput::ok(""))
        .respond("blueutil --is-connected AA:BB:CC:DD:EE:FF", CommandOutput::ok("1"))
        .after(
            "blueutil --connect AA:BB:CC:DD:EE:FF",
            "system_profiler SPBluetoothDataType",
            inventory_high(),
        )
        .into_arc();

    let outcome = run_fallbacks(&runner, FallbackMode::Smart, false, &unnamed()).await;

    assert_eq!(outcome.succeeded_with, Some(StrategyKind::DaemonRestart));
    assert_eq!(
        runner.mutations(),
        vec![
            "pkill bluetoothd".to_owned(),
            "blueutil --connect AA:BB:CC:DD:EE:FF".to_owned(),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn dry_run_logs_instead_of_acting() {
    let runner = ScriptedRunner::new(&[
        "system_profiler",
        "SwitchAudioSource",
        "BluetoothConnector",
        "osascript",
    ])
    .respond("system_profiler SPBluetoothDataType", inventory_low())
    .into_arc();

    let outcome = run_fallbacks(&runner, FallbackMode::Exhaustive, true, &named()).await;

    assert_eq!(
        statuses(&outcome),
        vec![
            (StrategyKind::AudioCycle, StrategyStatus::Skipped),
            (StrategyKind::AlternateTool, StrategyStatus::Skipped),
            (StrategyKind::GuiToggle, StrategyStatus::Skipped),
            (StrategyKind::DaemonRestart, StrategyStatus::Unavailable),
            (StrategyKind::Manual, StrategyStatus::Guidance),
        ]
    );
    assert!(runner.mutations().is_empty());
}
