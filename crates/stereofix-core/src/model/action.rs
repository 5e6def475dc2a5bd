use serde::{Deserialize, Serialize};
use strum::Display;

/// A mutating Bluetooth operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum BluetoothAction {
    Disconnect,
    Connect,
}

/// Classified outcome of a single mutating call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ActionStatus {
    Success,
    ToolMissing,
    ExecutionFailed,
    Timeout,
}

impl ActionStatus {
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

/// Result of an action, with the raw tool output kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResult {
    pub action: BluetoothAction,
    pub status: ActionStatus,
    pub diagnostics: String,
    /// The call was only logged, never issued.
    pub dry_run: bool,
}
