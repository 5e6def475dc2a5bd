use std::fmt;

use serde::Serialize;

use super::attempt::RecoveryAttempt;
use super::device::DeviceIdentity;
use super::state::ConnectionState;
use super::strategy::{StrategyKind, StrategyReport};

/// Which part of the run restored the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum RecoveryMethod {
    Primary,
    Fallback(StrategyKind),
}

impl fmt::Display for RecoveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => f.write_str("primary"),
            Self::Fallback(kind) => write!(f, "fallback:{kind}"),
        }
    }
}

impl From<RecoveryMethod> for String {
    fn from(method: RecoveryMethod) -> Self {
        method.to_string()
    }
}

/// Result of a full recovery run.
#[derive(Debug, Clone, Serialize)]
pub struct RecoveryReport {
    pub device: DeviceIdentity,
    pub success: bool,
    pub attempts_used: u32,
    pub method_used: Option<RecoveryMethod>,
    /// Failure summary; `None` on success.
    pub reason: Option<String>,
    /// State seen by the last probe of the run.
    pub final_state: ConnectionState,
    pub attempts: Vec<RecoveryAttempt>,
    pub fallbacks: Vec<StrategyReport>,
    pub diagnostics: Vec<String>,
    /// Manual recovery steps; always populated when `success` is false.
    pub guidance: Vec<String>,
    pub dry_run: bool,
}
