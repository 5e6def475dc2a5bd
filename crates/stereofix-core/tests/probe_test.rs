#![allow(clippy::unwrap_used)]
// Status probing and source reconciliation.

mod support;

use std::sync::Arc;

use pretty_assertions::assert_eq;

use stereofix_core::{
    CommandOutput, CommandRunner, Confidence, ConnectionState, CoreError, MacFormat, Orchestrator,
    ProbeSource,
};
use support::{ADDRESS, NAME, ScriptedRunner, config, control, inventory_absent, inventory_low};

fn orchestrator(runner: &Arc<ScriptedRunner>) -> Orchestrator {
    let runner: Arc<dyn CommandRunner> = Arc::clone(runner) as Arc<dyn CommandRunner>;
    Orchestrator::with_runner(config(), runner).unwrap()
}

#[tokio::test]
async fn missing_tools_yield_unknown_without_error() {
    let runner = ScriptedRunner::new(&[]).into_arc();
    let report = orchestrator(&runner)
        .probe_status("aa-bb-cc-dd-ee-ff")
        .await
        .unwrap();

    assert_eq!(report.state, ConnectionState::Unknown);
    assert_eq!(report.probes.len(), 3);
    assert!(report.probes.iter().all(|p| p.judgment.is_none()));
    assert!(report.probes.iter().all(|p| p.confidence == Confidence::None));
    assert_eq!(report.address_format, None);
}

#[tokio::test]
async fn invalid_address_is_rejected() {
    let runner = ScriptedRunner::new(&[]).into_arc();
    let err = orchestrator(&runner)
        .probe_status("AA:BB:CC:DD:EE")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidAddressFormat { .. }));
}

#[tokio::test]
async fn working_address_format_is_searched_once() {
    // Only the upper-case dash layout is accepted; everything else errors.
    let runner = ScriptedRunner::new(&["blueutil"])
        .respond(
            &control("--is-connected AA-BB-CC-DD-EE-FF"),
            CommandOutput::ok("0"),
        )
        .into_arc();
    let orch = orchestrator(&runner);

    let first = orch.probe_status(ADDRESS).await.unwrap();
    let second = orch.probe_status(ADDRESS).await.unwrap();

    assert_eq!(first.state, ConnectionState::Disconnected);
    assert_eq!(second.state, ConnectionState::Disconnected);
    assert_eq!(second.address_format, Some(MacFormat::DashUpper));
    assert_eq!(runner.count(&control("--is-connected AA:BB:CC:DD:EE:FF")), 1);
    assert_eq!(runner.count(&control("--is-connected aa:bb:cc:dd:ee:ff")), 1);
    assert_eq!(runner.count(&control("--is-connected AA-BB-CC-DD-EE-FF")), 2);
    assert_eq!(runner.count(&control("--is-connected aa-bb-cc-dd-ee-ff")), 0);
}

#[tokio::test]
async fn a_positive_source_outweighs_negative_ones() {
    let runner = ScriptedRunner::new(&["blueutil", "system_profiler", "SwitchAudioSource"])
        .respond(&control(&format!("--is-connected {ADDRESS}")), CommandOutput::ok("0"))
        .respond("system_profiler SPBluetoothDataType", inventory_absent())
        .respond(
            "SwitchAudioSource -a -t output",
            CommandOutput::ok(format!("MacBook Pro Speakers (output)\n{NAME} (output)\n")),
        )
        .into_arc();

    let report = orchestrator(&runner).probe_status(ADDRESS).await.unwrap();

    assert_eq!(report.state, ConnectionState::Connected);
    let judgments: Vec<(ProbeSource, Option<ConnectionState>)> =
        report.probes.iter().map(|p| (p.source, p.judgment)).collect();
    assert_eq!(
        judgments,
        vec![
            (ProbeSource::Control, Some(ConnectionState::Disconnected)),
            (ProbeSource::Inventory, Some(ConnectionState::Disconnected)),
            (ProbeSource::Audio, Some(ConnectionState::Connected)),
        ]
    );
}

#[tokio::test]
async fn inventory_refines_a_bare_connected_answer() {
    let runner = ScriptedRunner::new(&["blueutil", "system_profiler", "SwitchAudioSource"])
        .respond(&control(&format!("--is-connected {ADDRESS}")), CommandOutput::ok("1"))
        .respond("system_profiler SPBluetoothDataType", inventory_low())
        .into_arc();

    let report = orchestrator(&runner).probe_status(ADDRESS).await.unwrap();

    assert_eq!(report.state, ConnectionState::ConnectedLowQuality);
    // Profile detail settles it; the audio list is never consulted.
    assert_eq!(report.probes.len(), 2);
    assert_eq!(runner.count("SwitchAudioSource -a -t output"), 0);
}

#[tokio::test]
async fn negative_answers_alone_mean_disconnected() {
    let runner = ScriptedRunner::new(&["blueutil"])
        .respond(&control(&format!("--is-connected {ADDRESS}")), CommandOutput::ok("0"))
        .into_arc();

    let report = orchestrator(&runner).probe_status(ADDRESS).await.unwrap();
    assert_eq!(report.state, ConnectionState::Disconnected);
}

#[tokio::test]
async fn timed_out_control_tool_is_inconclusive() {
    let runner = ScriptedRunner::new(&["blueutil"])
        .respond(
            &control(&format!("--is-connected {ADDRESS}")),
            CommandOutput::timed_out(std::time::Duration::from_secs(10)),
        )
        .into_arc();

    let report = orchestrator(&runner).probe_status(ADDRESS).await.unwrap();

    assert_eq!(report.state, ConnectionState::Unknown);
    // A timeout is not a format rejection: no further variants are tried.
    assert_eq!(
        runner
            .calls()
            .iter()
            .filter(|c| c.contains("--is-connected"))
            .count(),
        1
    );
}
