// ── Orchestrator ──
//
// The facade the CLI talks to. Owns the runner, the prober, the action
// executor and discovery for one invocation, and wires them into the
// sequencer and fallback selector for `run_recovery`.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::action::ActionExecutor;
use crate::config::RecoveryConfig;
use crate::discovery::{DeviceDiscovery, filter_by_name_hint};
use crate::error::CoreError;
use crate::fallback::{FallbackOutcome, FallbackSelector, manual_guidance};
use crate::model::{
    DeviceIdentity, DiscoveredDevice, FailureReason, MacAddress, ProbeSource, RecoveryMethod,
    RecoveryReport, StatusReport,
};
use crate::probe::{FormatCache, StatusProber};
use crate::runner::{CommandRunner, SystemRunner};
use crate::sequencer::{RecoverySequencer, SequenceOutcome};

pub struct Orchestrator {
    config: RecoveryConfig,
    runner: Arc<dyn CommandRunner>,
    prober: StatusProber,
    executor: ActionExecutor,
    discovery: DeviceDiscovery,
}

impl Orchestrator {
    /// Build an orchestrator that drives the real system tools.
    pub fn new(config: RecoveryConfig) -> Result<Self, CoreError> {
        Self::with_runner(config, Arc::new(SystemRunner::new()))
    }

    /// Build an orchestrator over an arbitrary command runner.
    pub fn with_runner(
        config: RecoveryConfig,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<Self, CoreError> {
        config.validate()?;

        let timeout = config.durations.command_timeout;
        let formats = Arc::new(FormatCache::new());
        let prober = StatusProber::new(
            Arc::clone(&runner),
            config.tools.clone(),
            timeout,
            Arc::clone(&formats),
        );
        let executor = ActionExecutor::new(
            Arc::clone(&runner),
            config.tools.control.clone(),
            timeout,
            formats,
            config.dry_run,
        );
        let discovery = DeviceDiscovery::new(Arc::clone(&runner), config.tools.clone(), timeout);

        Ok(Self {
            config,
            runner,
            prober,
            executor,
            discovery,
        })
    }

    pub fn config(&self) -> &RecoveryConfig {
        &self.config
    }

    pub fn prober(&self) -> &StatusProber {
        &self.prober
    }

    // ── Read-only entry points ───────────────────────────────────────

    /// Probe one device. Fails only when `address` is not a valid address.
    pub async fn probe_status(&self, address: &str) -> Result<StatusReport, CoreError> {
        let address = MacAddress::parse(address)?;
        let name = match (&self.config.address, &self.config.name) {
            (Some(configured), Some(name)) if *configured == address => Some(name.clone()),
            _ => self.discovery.lookup_name(&address).await,
        };
        Ok(self
            .status_of(&DeviceIdentity::configured(address, name))
            .await)
    }

    /// Probe an already resolved device.
    pub async fn status_of(&self, identity: &DeviceIdentity) -> StatusReport {
        let summary = self.prober.probe_detailed(identity).await;
        StatusReport {
            device: identity.clone(),
            state: summary.state,
            probes: summary.results,
            address_format: self.prober.formats().get(),
        }
    }

    pub async fn discover_devices(&self) -> Vec<DiscoveredDevice> {
        self.discovery.discover().await
    }

    /// Decide which device this run targets.
    ///
    /// A configured address is used as-is unless discovery can list
    /// devices and it is not among them; then the best name-hint match
    /// replaces it. With no address, the best match is required.
    pub async fn resolve_target(&self) -> Result<DeviceIdentity, CoreError> {
        let hints = self.hints();
        let devices = self.discovery.discover().await;

        if let Some(address) = self.config.address {
            if let Some(found) = devices.iter().find(|d| d.address == address) {
                let name = self
                    .config
                    .name
                    .clone()
                    .or_else(|| (!found.name.is_empty()).then(|| found.name.clone()));
                return Ok(DeviceIdentity::configured(address, name));
            }
            if let Some(candidate) = filter_by_name_hint(devices, &hints).into_iter().next() {
                warn!(
                    configured = %address,
                    replacement = %candidate.address,
                    name = %candidate.name,
                    "configured address not found; using discovered device"
                );
                return Ok(DeviceIdentity::detected(candidate.address, candidate.name));
            }
            return Ok(DeviceIdentity::configured(address, self.config.name.clone()));
        }

        match filter_by_name_hint(devices, &hints).into_iter().next() {
            Some(candidate) => {
                info!(address = %candidate.address, name = %candidate.name, "auto-selected device");
                Ok(DeviceIdentity::detected(candidate.address, candidate.name))
            }
            None => Err(CoreError::DeviceNotResolved {
                hint: format!("any of: {}", hints.join(", ")),
            }),
        }
    }

    // ── Recovery ─────────────────────────────────────────────────────

    /// Run the primary sequence and, when it gives up, the fallbacks.
    ///
    /// Errors only when no status source is installed or no target can be
    /// resolved; every other failure is described by the report.
    pub async fn run_recovery(&self, cancel: &CancellationToken) -> Result<RecoveryReport, CoreError> {
        let sources = self.prober.available_sources();
        if sources.is_empty() {
            return Err(CoreError::ToolUnavailable {
                capability: "status".into(),
                tools: ProbeSource::ALL
                    .iter()
                    .map(|&s| self.prober.program(s))
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }

        let identity = self.resolve_target().await?;
        info!(
            device = %identity.label(),
            auto_detected = identity.auto_detected,
            dry_run = self.config.dry_run,
            "starting recovery"
        );

        let mut diagnostics = vec![format!(
            "status sources: {}",
            sources
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        )];

        let sequencer = RecoverySequencer::new(
            &self.prober,
            &self.executor,
            self.config.durations.clone(),
            self.config.max_attempts,
            self.config.dry_run,
        );
        let outcome = sequencer.run(&identity, cancel).await;

        if let Some(format) = self.prober.formats().get() {
            diagnostics.push(format!(
                "{} accepted address format {format}",
                self.config.tools.control
            ));
        }
        for attempt in &outcome.attempts {
            if let Some(reason) = &attempt.failure {
                diagnostics.push(format!("attempt {}: {reason}", attempt.number));
            }
        }

        if outcome.succeeded {
            info!(attempts = outcome.attempts_used(), "recovery succeeded");
            return Ok(self.report(identity, outcome, FallbackOutcome::default(), diagnostics));
        }

        let not_connected = matches!(
            outcome.last_failure(),
            Some(FailureReason::NotConnected { .. })
        );
        let mut fallbacks = FallbackOutcome::default();
        if self.config.enable_fallbacks && !not_connected && !outcome.cancelled {
            let mut target = identity.clone();
            if target.name.is_none() {
                target.name = self.discovery.lookup_name(&target.address).await;
            }
            let selector = FallbackSelector::new(
                Arc::clone(&self.runner),
                &self.prober,
                &self.executor,
                &self.config.tools,
                &self.config.durations,
                self.config.fallback_mode,
                self.config.dry_run,
            );
            fallbacks = selector.run(&target, cancel).await;
            for report in &fallbacks.reports {
                diagnostics.push(format!(
                    "fallback {}: {} {}",
                    report.kind, report.status, report.detail
                ));
            }
        }

        Ok(self.report(identity, outcome, fallbacks, diagnostics))
    }

    fn report(
        &self,
        device: DeviceIdentity,
        outcome: SequenceOutcome,
        fallbacks: FallbackOutcome,
        diagnostics: Vec<String>,
    ) -> RecoveryReport {
        let attempts_used = outcome.attempts_used();
        let final_state = fallbacks.final_state.unwrap_or(outcome.final_state);

        let (success, method_used) = if outcome.succeeded {
            (true, Some(RecoveryMethod::Primary))
        } else if let Some(kind) = fallbacks.succeeded_with {
            (true, Some(RecoveryMethod::Fallback(kind)))
        } else {
            (false, None)
        };

        let reason = if success {
            None
        } else if outcome.cancelled {
            Some("cancelled".to_owned())
        } else {
            Some(match outcome.last_failure() {
                Some(FailureReason::NotConnected { .. }) => "not connected".to_owned(),
                Some(last) if fallbacks.reports.is_empty() => {
                    format!("all {attempts_used} attempts failed (last: {last})")
                }
                Some(last) => format!(
                    "all {attempts_used} attempts and fallbacks failed (last attempt: {last})"
                ),
                None => "no recovery attempt was made".to_owned(),
            })
        };

        let guidance = match (success, fallbacks.guidance.is_empty()) {
            (true, _) => Vec::new(),
            (false, false) => fallbacks.guidance,
            (false, true) => manual_guidance(&device),
        };
        if !success {
            warn!(reason = reason.as_deref().unwrap_or_default(), "recovery failed");
        }

        RecoveryReport {
            device,
            success,
            attempts_used,
            method_used,
            reason,
            final_state,
            attempts: outcome.attempts,
            fallbacks: fallbacks.reports,
            diagnostics,
            guidance,
            dry_run: self.config.dry_run,
        }
    }

    fn hints(&self) -> Vec<String> {
        self.config
            .name
            .iter()
            .chain(self.config.name_hints.iter())
            .cloned()
            .collect()
    }
}
