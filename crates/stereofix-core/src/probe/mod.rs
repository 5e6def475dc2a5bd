//! Device status prober.
//!
//! Answers "is the target connected, and on which profile?" by consulting
//! the probe sources in [`ProbeSource::ALL`] order and reconciling their
//! answers optimistically:
//!
//! - a positive judgment is trusted and never overturned by a later
//!   negative one;
//! - probing stops at the first positive judgment that carries profile
//!   detail, while a bare "connected" keeps later sources in play so they
//!   can refine the profile;
//! - negative judgments count only when no source was positive, and a run
//!   with no judgments at all is [`ConnectionState::Unknown`].
//!
//! Probing never fails and never mutates device state.

pub mod parse;

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tracing::{debug, info};

use crate::config::ToolPaths;
use crate::model::{
    Confidence, ConnectionState, DeviceIdentity, MacAddress, MacFormat, ProbeResult, ProbeSource,
    ProfileHint,
};
use crate::runner::CommandRunner;

use self::parse::ControlReply;

// ── FormatCache ─────────────────────────────────────────────────────

/// Remembers which address layout the control tool accepted.
///
/// Shared by the prober and the action executor; the search runs at most
/// once per process.
#[derive(Debug, Default)]
pub struct FormatCache {
    working: OnceLock<MacFormat>,
}

impl FormatCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<MacFormat> {
        self.working.get().copied()
    }

    pub fn remember(&self, format: MacFormat) {
        if self.working.set(format).is_ok() {
            debug!(%format, "remembering working address format");
        }
    }

    /// Layouts to try: the remembered one alone, or all six.
    pub fn candidates(&self, address: &MacAddress) -> Vec<(MacFormat, String)> {
        match self.get() {
            Some(format) => vec![(format, address.format(format))],
            None => address.variants(),
        }
    }

    /// The layout to use for a mutating call.
    pub fn preferred(&self, address: &MacAddress) -> String {
        address.format(self.get().unwrap_or(MacFormat::ColonUpper))
    }
}

// ── StatusProber ────────────────────────────────────────────────────

/// Reconciled probe result with the per-source evidence behind it.
#[derive(Debug, Clone)]
pub struct ProbeSummary {
    pub state: ConnectionState,
    pub results: Vec<ProbeResult>,
}

pub struct StatusProber {
    runner: Arc<dyn CommandRunner>,
    tools: ToolPaths,
    timeout: Duration,
    formats: Arc<FormatCache>,
}

impl StatusProber {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        tools: ToolPaths,
        timeout: Duration,
        formats: Arc<FormatCache>,
    ) -> Self {
        Self {
            runner,
            tools,
            timeout,
            formats,
        }
    }

    pub fn formats(&self) -> &Arc<FormatCache> {
        &self.formats
    }

    /// Program backing each probe source.
    pub fn program(&self, source: ProbeSource) -> &str {
        match source {
            ProbeSource::Control => &self.tools.control,
            ProbeSource::Inventory => &self.tools.inventory,
            ProbeSource::Audio => &self.tools.audio,
        }
    }

    /// Sources whose program is installed.
    pub fn available_sources(&self) -> Vec<ProbeSource> {
        ProbeSource::ALL
            .into_iter()
            .filter(|&s| self.runner.is_available(self.program(s)))
            .collect()
    }

    pub async fn probe(&self, identity: &DeviceIdentity) -> ConnectionState {
        self.probe_detailed(identity).await.state
    }

    pub async fn probe_detailed(&self, identity: &DeviceIdentity) -> ProbeSummary {
        let mut results = Vec::with_capacity(ProbeSource::ALL.len());
        let mut positive: Option<ConnectionState> = None;

        for source in ProbeSource::ALL {
            let result = self.query(source, identity).await;
            debug!(
                %source,
                judgment = ?result.judgment,
                confidence = %result.confidence,
                "probe source answered"
            );
            positive = match (positive, result.judgment) {
                (None, Some(judged)) if judged.is_connected() => Some(judged),
                // Later sources may add profile detail, never overturn.
                (Some(ConnectionState::Connected), Some(judged))
                    if judged.is_connected() && judged != ConnectionState::Connected =>
                {
                    Some(judged)
                }
                (current, _) => current,
            };
            results.push(result);

            if positive.is_some_and(|s| s != ConnectionState::Connected) {
                break;
            }
        }

        let state = positive.unwrap_or_else(|| {
            if results
                .iter()
                .any(|r| r.judgment == Some(ConnectionState::Disconnected))
            {
                ConnectionState::Disconnected
            } else {
                ConnectionState::Unknown
            }
        });
        info!(device = %identity.label(), %state, "device state");
        ProbeSummary { state, results }
    }

    async fn query(&self, source: ProbeSource, identity: &DeviceIdentity) -> ProbeResult {
        let program = self.program(source);
        if !self.runner.is_available(program) {
            return ProbeResult::inconclusive(source, format!("{program} not installed"));
        }
        match source {
            ProbeSource::Control => self.query_control(program, &identity.address).await,
            ProbeSource::Inventory => self.query_inventory(program, &identity.address).await,
            ProbeSource::Audio => self.query_audio(program, identity.name.as_deref()).await,
        }
    }

    async fn query_control(&self, program: &str, address: &MacAddress) -> ProbeResult {
        let mut last_raw = String::new();

        for (format, rendered) in self.formats.candidates(address) {
            let output = self
                .runner
                .run(program, &["--is-connected", &rendered], self.timeout)
                .await;
            last_raw = output.combined();

            match parse::parse_control_status(&output) {
                ControlReply::Connected => {
                    self.formats.remember(format);
                    return ProbeResult::judged(
                        ProbeSource::Control,
                        last_raw,
                        ConnectionState::Connected,
                        Confidence::High,
                    );
                }
                ControlReply::Disconnected => {
                    self.formats.remember(format);
                    return ProbeResult::judged(
                        ProbeSource::Control,
                        last_raw,
                        ConnectionState::Disconnected,
                        Confidence::High,
                    );
                }
                ControlReply::Rejected => {
                    debug!(%format, "control tool rejected address format");
                }
                ControlReply::Unavailable => break,
            }
        }

        ProbeResult::inconclusive(ProbeSource::Control, last_raw)
    }

    async fn query_inventory(&self, program: &str, address: &MacAddress) -> ProbeResult {
        let output = self
            .runner
            .run(program, &["SPBluetoothDataType"], self.timeout)
            .await;
        if !output.success() {
            return ProbeResult::inconclusive(ProbeSource::Inventory, output.combined());
        }

        let entries = parse::parse_inventory(&output.stdout);
        let Some(entry) = entries.iter().find(|e| e.address == *address) else {
            return ProbeResult::judged(
                ProbeSource::Inventory,
                format!("{address} not listed"),
                ConnectionState::Disconnected,
                Confidence::Low,
            );
        };

        let raw = format!(
            "{} ({}): connected={:?} profile={:?}",
            entry.name, entry.address, entry.connected, entry.profile
        );
        match entry.connected {
            Some(true) => ProbeResult::judged(
                ProbeSource::Inventory,
                raw,
                ProfileHint::connected_state(entry.profile),
                Confidence::Medium,
            ),
            Some(false) => ProbeResult::judged(
                ProbeSource::Inventory,
                raw,
                ConnectionState::Disconnected,
                Confidence::Medium,
            ),
            None => ProbeResult::inconclusive(ProbeSource::Inventory, raw),
        }
    }

    async fn query_audio(&self, program: &str, name: Option<&str>) -> ProbeResult {
        let Some(name) = name else {
            return ProbeResult::inconclusive(ProbeSource::Audio, "device name unknown");
        };

        let output = self
            .runner
            .run(program, &["-a", "-t", "output"], self.timeout)
            .await;
        if !output.success() {
            return ProbeResult::inconclusive(ProbeSource::Audio, output.combined());
        }

        let outputs = parse::parse_audio_devices(&output.stdout);
        if outputs.iter().any(|o| parse::names_match(o, name)) {
            ProbeResult::judged(
                ProbeSource::Audio,
                format!("'{name}' listed as audio output"),
                ConnectionState::Connected,
                Confidence::Low,
            )
        } else {
            ProbeResult::judged(
                ProbeSource::Audio,
                format!("'{name}' not among {} audio outputs", outputs.len()),
                ConnectionState::Disconnected,
                Confidence::Low,
            )
        }
    }
}
