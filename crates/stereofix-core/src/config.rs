// ── Runtime recovery configuration ──
//
// These types describe *what* to recover and *how patiently*. They never
// touch disk: the CLI builds a `RecoveryConfig` from its config file and
// flags and hands it to the `Orchestrator`.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::CoreError;
use crate::model::MacAddress;

/// Fallback selection policy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum FallbackMode {
    /// Run only the least invasive strategy whose precondition holds.
    #[default]
    Smart,
    /// Try every available strategy in priority order until one succeeds.
    Exhaustive,
}

/// Phase-duration table consulted by the sequencer and fallbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseDurations {
    /// Settle time after disconnecting. Shorter waits let the stack treat
    /// the cycle as a single bounce and skip profile renegotiation.
    pub disconnect_wait: Duration,
    /// Renegotiation time after reconnecting.
    pub reconnect_wait: Duration,
    /// Pause between full attempts.
    pub retry_pause: Duration,
    /// Pause between fallback strategies (exhaustive mode).
    pub fallback_pause: Duration,
    /// Upper bound for any single external command.
    pub command_timeout: Duration,
}

impl Default for PhaseDurations {
    fn default() -> Self {
        Self {
            disconnect_wait: Duration::from_secs(3),
            reconnect_wait: Duration::from_secs(2),
            retry_pause: Duration::from_secs(2),
            fallback_pause: Duration::from_secs(1),
            command_timeout: Duration::from_secs(10),
        }
    }
}

/// Names (or paths) of the external programs the core drives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    /// Bluetooth control tool: status queries, connect, disconnect.
    pub control: String,
    /// System device inventory.
    pub inventory: String,
    /// Audio output switcher.
    pub audio: String,
    /// Secondary Bluetooth control tool used as a fallback.
    pub alternate: String,
    /// UI scripting host.
    pub automation: String,
    /// Process signalling tool for the daemon restart.
    pub process_kill: String,
    /// Prints the effective user id.
    pub user_id: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            control: "blueutil".into(),
            inventory: "system_profiler".into(),
            audio: "SwitchAudioSource".into(),
            alternate: "BluetoothConnector".into(),
            automation: "osascript".into(),
            process_kill: "pkill".into(),
            user_id: "id".into(),
        }
    }
}

/// Name fragments used to auto-select a headset when no address is set.
pub fn default_name_hints() -> Vec<String> {
    [
        "AirPods",
        "Headphones",
        "Headset",
        "Buds",
        "Beats",
        "WH-",
        "WF-",
        "Bose",
        "Jabra",
    ]
    .iter()
    .map(|s| (*s).to_owned())
    .collect()
}

/// Everything one recovery run needs.
///
/// Built by the CLI, passed to `Orchestrator`; immutable for the run.
#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    /// Target address. `None` lets discovery pick a device.
    pub address: Option<MacAddress>,
    /// Target name, used by audio-based probes and fallbacks.
    pub name: Option<String>,
    /// Substrings matched against device names during discovery.
    pub name_hints: Vec<String>,
    pub durations: PhaseDurations,
    pub max_attempts: u32,
    pub enable_fallbacks: bool,
    pub fallback_mode: FallbackMode,
    /// Walk every phase and log intended actions without mutating anything.
    pub dry_run: bool,
    pub tools: ToolPaths,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            address: None,
            name: None,
            name_hints: default_name_hints(),
            durations: PhaseDurations::default(),
            max_attempts: 3,
            enable_fallbacks: true,
            fallback_mode: FallbackMode::default(),
            dry_run: false,
            tools: ToolPaths::default(),
        }
    }
}

impl RecoveryConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.max_attempts == 0 {
            return Err(CoreError::InvalidConfig {
                message: "max_attempts must be at least 1".into(),
            });
        }
        if self.durations.command_timeout.is_zero() {
            return Err(CoreError::InvalidConfig {
                message: "command timeout must be greater than zero".into(),
            });
        }
        if self.address.is_none() && self.name.is_none() && self.name_hints.is_empty() {
            return Err(CoreError::InvalidConfig {
                message: "no device address, name, or name hints configured".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_timings() {
        let d = PhaseDurations::default();
        assert_eq!(d.disconnect_wait, Duration::from_secs(3));
        assert_eq!(d.reconnect_wait, Duration::from_secs(2));
        assert_eq!(d.retry_pause, Duration::from_secs(2));
        assert_eq!(d.command_timeout, Duration::from_secs(10));
        assert_eq!(RecoveryConfig::default().max_attempts, 3);
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let cfg = RecoveryConfig {
            max_attempts: 0,
            ..RecoveryConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(CoreError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn target_must_be_resolvable() {
        let cfg = RecoveryConfig {
            name_hints: Vec::new(),
            ..RecoveryConfig::default()
        };
        assert!(cfg.validate().is_err());
        assert!(RecoveryConfig::default().validate().is_ok());
    }

    #[test]
    fn fallback_mode_parses_from_kebab_case() {
        assert_eq!("exhaustive".parse::<FallbackMode>().ok(), Some(FallbackMode::Exhaustive));
        assert_eq!(FallbackMode::Smart.to_string(), "smart");
    }
}
