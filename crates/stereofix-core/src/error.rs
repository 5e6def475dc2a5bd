// ── Core error types ──
//
// Hard failures only. Anything that goes wrong inside a single recovery
// attempt (a failed disconnect, a timeout, an inconclusive verification)
// is recorded as a `FailureReason` on the attempt and never surfaces here.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Input errors ─────────────────────────────────────────────────
    #[error("Invalid Bluetooth address '{input}': expected 12 hexadecimal digits")]
    InvalidAddressFormat { input: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    // ── Environment errors ───────────────────────────────────────────
    #[error("No {capability} tool is available (looked for: {tools})")]
    ToolUnavailable { capability: String, tools: String },

    #[error("No Bluetooth device matched {hint}")]
    DeviceNotResolved { hint: String },
}

impl CoreError {
    pub(crate) fn invalid_address(input: &str) -> Self {
        Self::InvalidAddressFormat {
            input: input.to_owned(),
        }
    }
}
