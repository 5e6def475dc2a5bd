use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Alternate recovery methods, listed least invasive first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum StrategyKind {
    /// Switch the default output away from the headset and back.
    AudioCycle,
    /// Disconnect/reconnect through a second Bluetooth control tool.
    AlternateTool,
    /// Toggle the connection through UI scripting.
    GuiToggle,
    /// Restart the Bluetooth daemon (requires root).
    DaemonRestart,
    /// Print manual recovery steps.
    Manual,
}

impl StrategyKind {
    /// Fixed priority order used by both selection modes.
    pub const PRIORITY: [Self; 5] = [
        Self::AudioCycle,
        Self::AlternateTool,
        Self::GuiToggle,
        Self::DaemonRestart,
        Self::Manual,
    ];

    pub fn description(self) -> &'static str {
        match self {
            Self::AudioCycle => "cycle the system audio output",
            Self::AlternateTool => "reconnect with an alternate Bluetooth tool",
            Self::GuiToggle => "toggle the connection via UI scripting",
            Self::DaemonRestart => "restart the Bluetooth daemon",
            Self::Manual => "manual recovery guidance",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum StrategyStatus {
    Succeeded,
    Failed,
    /// Precondition did not hold; the strategy was not executed.
    Unavailable,
    /// Dry run: the intended actions were logged only.
    Skipped,
    /// Produced instructions for the user instead of acting.
    Guidance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyReport {
    pub kind: StrategyKind,
    pub status: StrategyStatus,
    pub detail: String,
}

impl StrategyReport {
    pub fn new(kind: StrategyKind, status: StrategyStatus, detail: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            detail: detail.into(),
        }
    }
}
