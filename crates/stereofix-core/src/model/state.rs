// ── Connection state and probe evidence ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Connection and audio-profile state of the target device.
///
/// Recomputed on every query; the device can change state at any time
/// outside this process.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ConnectionState {
    #[default]
    Unknown,
    Disconnected,
    /// Connected, profile not determinable.
    Connected,
    /// Connected on the stereo profile (A2DP).
    ConnectedHighQuality,
    /// Connected on the call profile (HFP/HSP).
    ConnectedLowQuality,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        matches!(
            self,
            Self::Connected | Self::ConnectedHighQuality | Self::ConnectedLowQuality
        )
    }

    /// Whether this state counts as a successful recovery.
    ///
    /// Plain `Connected` qualifies because most probe sources cannot see the
    /// active profile at all.
    pub fn is_restored(self) -> bool {
        matches!(self, Self::Connected | Self::ConnectedHighQuality)
    }
}

/// Audio profile hint extracted from free-text tool output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ProfileHint {
    HighQuality,
    LowQuality,
}

impl ProfileHint {
    pub fn connected_state(hint: Option<Self>) -> ConnectionState {
        match hint {
            Some(Self::HighQuality) => ConnectionState::ConnectedHighQuality,
            Some(Self::LowQuality) => ConnectionState::ConnectedLowQuality,
            None => ConnectionState::Connected,
        }
    }
}

/// Identifies a read-only probe source, in consultation order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ProbeSource {
    /// Bluetooth control tool (`blueutil`).
    Control,
    /// System device inventory (`system_profiler`).
    Inventory,
    /// Audio output inventory (`SwitchAudioSource`).
    Audio,
}

impl ProbeSource {
    pub const ALL: [Self; 3] = [Self::Control, Self::Inventory, Self::Audio];
}

/// How much weight a probe judgment carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Confidence {
    None,
    Low,
    Medium,
    High,
}

/// Outcome of consulting a single probe source.
///
/// A source that could not run contributes `judgment: None`, never a
/// negative judgment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub source: ProbeSource,
    /// Raw tool response (or the reason the source was skipped).
    pub raw: String,
    pub judgment: Option<ConnectionState>,
    pub confidence: Confidence,
}

impl ProbeResult {
    pub fn judged(
        source: ProbeSource,
        raw: impl Into<String>,
        state: ConnectionState,
        confidence: Confidence,
    ) -> Self {
        Self {
            source,
            raw: raw.into(),
            judgment: Some(state),
            confidence,
        }
    }

    pub fn inconclusive(source: ProbeSource, raw: impl Into<String>) -> Self {
        Self {
            source,
            raw: raw.into(),
            judgment: None,
            confidence: Confidence::None,
        }
    }

    pub fn is_positive(&self) -> bool {
        self.judgment.is_some_and(ConnectionState::is_connected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restored_includes_plain_connected() {
        assert!(ConnectionState::Connected.is_restored());
        assert!(ConnectionState::ConnectedHighQuality.is_restored());
        assert!(!ConnectionState::ConnectedLowQuality.is_restored());
        assert!(!ConnectionState::Disconnected.is_restored());
        assert!(!ConnectionState::Unknown.is_restored());
    }

    #[test]
    fn low_quality_still_counts_as_connected() {
        assert!(ConnectionState::ConnectedLowQuality.is_connected());
        assert!(!ConnectionState::Unknown.is_connected());
    }

    #[test]
    fn state_display_is_kebab_case() {
        assert_eq!(
            ConnectionState::ConnectedLowQuality.to_string(),
            "connected-low-quality"
        );
    }
}
