// ── Fallback strategy selector ──
//
// Runs after the primary cycle gives up. Strategies are ordered least
// invasive first and each is gated by a precondition; a strategy whose
// precondition is false is reported `Unavailable` and never executed.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::action::ActionExecutor;
use crate::config::{FallbackMode, PhaseDurations, ToolPaths};
use crate::model::{
    ConnectionState, DeviceIdentity, MacFormat, StrategyKind, StrategyReport, StrategyStatus,
};
use crate::probe::{StatusProber, parse};
use crate::runner::CommandRunner;
use crate::sequencer::pause;

/// What the fallback pass did.
#[derive(Debug, Clone, Default)]
pub struct FallbackOutcome {
    pub reports: Vec<StrategyReport>,
    /// The strategy that restored the profile, if any.
    pub succeeded_with: Option<StrategyKind>,
    /// State seen by the last strategy re-probe.
    pub final_state: Option<ConnectionState>,
    pub guidance: Vec<String>,
}

impl FallbackOutcome {
    pub fn succeeded(&self) -> bool {
        self.succeeded_with.is_some()
    }
}

struct Execution {
    status: StrategyStatus,
    detail: String,
    observed: Option<ConnectionState>,
}

impl Execution {
    fn failed(detail: impl Into<String>) -> Self {
        Self {
            status: StrategyStatus::Failed,
            detail: detail.into(),
            observed: None,
        }
    }

    fn verified(observed: ConnectionState, detail: &str) -> Self {
        let status = if observed.is_restored() {
            StrategyStatus::Succeeded
        } else {
            StrategyStatus::Failed
        };
        Self {
            status,
            detail: format!("{detail}; device now {observed}"),
            observed: Some(observed),
        }
    }
}

pub struct FallbackSelector<'a> {
    runner: Arc<dyn CommandRunner>,
    prober: &'a StatusProber,
    executor: &'a ActionExecutor,
    tools: &'a ToolPaths,
    durations: &'a PhaseDurations,
    mode: FallbackMode,
    dry_run: bool,
}

impl<'a> FallbackSelector<'a> {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        prober: &'a StatusProber,
        executor: &'a ActionExecutor,
        tools: &'a ToolPaths,
        durations: &'a PhaseDurations,
        mode: FallbackMode,
        dry_run: bool,
    ) -> Self {
        Self {
            runner,
            prober,
            executor,
            tools,
            durations,
            mode,
            dry_run,
        }
    }

    /// Select and run strategies according to the configured mode.
    ///
    /// `identity.name` should already be resolved; strategies that need a
    /// name are unavailable without one.
    pub async fn run(&self, identity: &DeviceIdentity, cancel: &CancellationToken) -> FallbackOutcome {
        let mut outcome = FallbackOutcome::default();
        let mut executed_any = false;

        for kind in StrategyKind::PRIORITY {
            if cancel.is_cancelled() {
                debug!("fallbacks cancelled");
                break;
            }
            if !self.is_available(kind, identity).await {
                debug!(strategy = %kind, "precondition not met");
                outcome.reports.push(StrategyReport::new(
                    kind,
                    StrategyStatus::Unavailable,
                    self.unavailable_reason(kind, identity),
                ));
                continue;
            }

            if executed_any
                && self.mode == FallbackMode::Exhaustive
                && !pause(self.durations.fallback_pause, cancel, self.dry_run).await
            {
                break;
            }
            executed_any = true;

            info!(strategy = %kind, mode = %self.mode, "running fallback strategy");
            let execution = self.execute(kind, identity, cancel).await;
            if execution.status == StrategyStatus::Failed {
                warn!(strategy = %kind, detail = %execution.detail, "fallback strategy failed");
            }
            if execution.observed.is_some() {
                outcome.final_state = execution.observed;
            }
            if kind == StrategyKind::Manual {
                outcome.guidance = manual_guidance(identity);
            }
            let status = execution.status;
            outcome
                .reports
                .push(StrategyReport::new(kind, status, execution.detail));

            if status == StrategyStatus::Succeeded {
                outcome.succeeded_with = Some(kind);
                break;
            }
            if self.mode == FallbackMode::Smart {
                break;
            }
        }

        outcome
    }

    /// Whether `kind`'s precondition holds right now.
    pub async fn is_available(&self, kind: StrategyKind, identity: &DeviceIdentity) -> bool {
        let has_name = identity.name.is_some();
        match kind {
            StrategyKind::AudioCycle => has_name && self.runner.is_available(&self.tools.audio),
            StrategyKind::AlternateTool => self.runner.is_available(&self.tools.alternate),
            StrategyKind::GuiToggle => has_name && self.runner.is_available(&self.tools.automation),
            StrategyKind::DaemonRestart => {
                self.runner.is_available(&self.tools.process_kill) && self.running_as_root().await
            }
            StrategyKind::Manual => true,
        }
    }

    fn unavailable_reason(&self, kind: StrategyKind, identity: &DeviceIdentity) -> String {
        let missing = |program: &str| format!("{program} not installed");
        match kind {
            StrategyKind::AudioCycle | StrategyKind::GuiToggle if identity.name.is_none() => {
                "device name unknown".to_owned()
            }
            StrategyKind::AudioCycle => missing(&self.tools.audio),
            StrategyKind::AlternateTool => missing(&self.tools.alternate),
            StrategyKind::GuiToggle => missing(&self.tools.automation),
            StrategyKind::DaemonRestart if !self.runner.is_available(&self.tools.process_kill) => {
                missing(&self.tools.process_kill)
            }
            StrategyKind::DaemonRestart => "requires root privileges".to_owned(),
            StrategyKind::Manual => String::new(),
        }
    }

    async fn running_as_root(&self) -> bool {
        if !self.runner.is_available(&self.tools.user_id) {
            return false;
        }
        let output = self
            .runner
            .run(&self.tools.user_id, &["-u"], self.durations.command_timeout)
            .await;
        output.success() && output.stdout.trim() == "0"
    }

    async fn execute(
        &self,
        kind: StrategyKind,
        identity: &DeviceIdentity,
        cancel: &CancellationToken,
    ) -> Execution {
        match kind {
            StrategyKind::Manual => Execution {
                status: StrategyStatus::Guidance,
                detail: "manual recovery steps provided".to_owned(),
                observed: None,
            },
            _ if self.dry_run => {
                let plan = self.describe(kind, identity);
                info!("[dry-run] would {plan}");
                Execution {
                    status: StrategyStatus::Skipped,
                    detail: format!("dry run: would {plan}"),
                    observed: None,
                }
            }
            StrategyKind::AudioCycle => self.audio_cycle(identity, cancel).await,
            StrategyKind::AlternateTool => self.alternate_tool(identity, cancel).await,
            StrategyKind::GuiToggle => self.gui_toggle(identity, cancel).await,
            StrategyKind::DaemonRestart => self.daemon_restart(identity, cancel).await,
        }
    }

    fn describe(&self, kind: StrategyKind, identity: &DeviceIdentity) -> String {
        let name = identity.name.as_deref().unwrap_or("device");
        match kind {
            StrategyKind::AudioCycle => {
                format!("switch audio output away from '{name}' and back")
            }
            StrategyKind::AlternateTool => format!(
                "run {} --disconnect/--connect {}",
                self.tools.alternate,
                identity.address.format(MacFormat::DashLower)
            ),
            StrategyKind::GuiToggle => format!("toggle '{name}' via {}", self.tools.automation),
            StrategyKind::DaemonRestart => {
                format!("run {} bluetoothd and reconnect", self.tools.process_kill)
            }
            StrategyKind::Manual => kind.description().to_owned(),
        }
    }

    // ── Strategies ──────────────────────────────────────────────────

    async fn audio_cycle(&self, identity: &DeviceIdentity, cancel: &CancellationToken) -> Execution {
        let Some(name) = identity.name.as_deref() else {
            return Execution::failed("device name unknown");
        };
        let program = self.tools.audio.as_str();
        let timeout = self.durations.command_timeout;

        let listing = self.runner.run(program, &["-a", "-t", "output"], timeout).await;
        if !listing.success() {
            return Execution::failed(format!("listing outputs failed: {}", listing.combined()));
        }
        let outputs = parse::parse_audio_devices(&listing.stdout);
        let Some(other) = outputs.iter().find(|o| !parse::names_match(o, name)) else {
            return Execution::failed("no other audio output to switch to");
        };

        let away = self
            .runner
            .run(program, &["-s", other, "-t", "output"], timeout)
            .await;
        if !away.success() {
            return Execution::failed(format!("switching to '{other}' failed: {}", away.combined()));
        }
        if !pause(self.durations.fallback_pause, cancel, false).await {
            return Execution::failed("cancelled");
        }

        let back = self
            .runner
            .run(program, &["-s", name, "-t", "output"], timeout)
            .await;
        if !back.success() {
            return Execution::failed(format!("switching back to '{name}' failed: {}", back.combined()));
        }
        if !pause(self.durations.reconnect_wait, cancel, false).await {
            return Execution::failed("cancelled");
        }

        let observed = self.prober.probe(identity).await;
        Execution::verified(observed, &format!("cycled output via '{other}'"))
    }

    async fn alternate_tool(&self, identity: &DeviceIdentity, cancel: &CancellationToken) -> Execution {
        let program = self.tools.alternate.as_str();
        let address = identity.address.format(MacFormat::DashLower);
        let timeout = self.durations.command_timeout;

        let down = self
            .runner
            .run(program, &["--disconnect", &address], timeout)
            .await;
        if !down.success() {
            return Execution::failed(format!("{program} --disconnect failed: {}", down.combined()));
        }
        if !pause(self.durations.disconnect_wait, cancel, false).await {
            return Execution::failed("cancelled");
        }

        let up = self.runner.run(program, &["--connect", &address], timeout).await;
        if !up.success() {
            return Execution::failed(format!("{program} --connect failed: {}", up.combined()));
        }
        if !pause(self.durations.reconnect_wait, cancel, false).await {
            return Execution::failed("cancelled");
        }

        let observed = self.prober.probe(identity).await;
        Execution::verified(observed, &format!("reconnected with {program}"))
    }

    async fn gui_toggle(&self, identity: &DeviceIdentity, cancel: &CancellationToken) -> Execution {
        let Some(name) = identity.name.as_deref() else {
            return Execution::failed("device name unknown");
        };
        let program = self.tools.automation.as_str();
        let script = gui_toggle_script(name);

        // The script itself waits between the two clicks.
        let timeout = self.durations.command_timeout + self.durations.disconnect_wait;
        let output = self.runner.run(program, &["-e", &script], timeout).await;
        if !output.success() {
            return Execution::failed(format!("UI scripting failed: {}", output.combined()));
        }
        if !pause(self.durations.reconnect_wait, cancel, false).await {
            return Execution::failed("cancelled");
        }

        let observed = self.prober.probe(identity).await;
        Execution::verified(observed, "toggled via UI scripting")
    }

    async fn daemon_restart(&self, identity: &DeviceIdentity, cancel: &CancellationToken) -> Execution {
        let program = self.tools.process_kill.as_str();
        let output = self
            .runner
            .run(program, &["bluetoothd"], self.durations.command_timeout)
            .await;
        if !output.success() {
            return Execution::failed(format!("{program} bluetoothd failed: {}", output.combined()));
        }

        // launchd respawns the daemon; give it both settle windows.
        let respawn = self.durations.disconnect_wait + self.durations.reconnect_wait;
        if !pause(respawn, cancel, false).await {
            return Execution::failed("cancelled");
        }

        let connect = self.executor.connect(&identity.address).await;
        if !connect.status.is_success() {
            return Execution::failed(format!(
                "reconnect after daemon restart failed ({}): {}",
                connect.status, connect.diagnostics
            ));
        }
        if !pause(self.durations.reconnect_wait, cancel, false).await {
            return Execution::failed("cancelled");
        }

        let observed = self.prober.probe(identity).await;
        Execution::verified(observed, "restarted bluetoothd")
    }
}

/// AppleScript that clicks the device's entry in the Bluetooth menu twice.
pub fn gui_toggle_script(name: &str) -> String {
    let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
    format!(
        r#"tell application "System Events"
    tell process "ControlCenter"
        set btItem to first menu bar item of menu bar 1 whose description contains "Bluetooth"
        click btItem
        delay 1
        set deviceToggle to first checkbox of scroll area 1 of group 1 of window 1 whose title contains "{escaped}"
        click deviceToggle
        delay 3
        click deviceToggle
        delay 1
        key code 53
    end tell
end tell"#
    )
}

/// Steps a user can follow when automated recovery gives up.
pub fn manual_guidance(identity: &DeviceIdentity) -> Vec<String> {
    let label = identity.label();
    let name = identity.name.as_deref().unwrap_or("the headset");
    vec![
        format!(
            "Open System Settings > Bluetooth, click the info button next to {label}, choose Disconnect, wait a few seconds, then Connect."
        ),
        format!(
            "In System Settings > Sound, select {name} as the output device and choose a different input (e.g. the built-in microphone)."
        ),
        "Quit apps that hold the microphone (calls, conferencing, dictation) so the headset can leave the call profile.".to_owned(),
        "Turn Bluetooth off and on again, or run `sudo pkill bluetoothd` to restart the Bluetooth daemon.".to_owned(),
        "If nothing helps, remove the device from Bluetooth settings and pair it again.".to_owned(),
    ]
}
