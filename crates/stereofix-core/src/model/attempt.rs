// ── Recovery attempt audit trail ──
//
// One `RecoveryAttempt` per disconnect/wait/reconnect/wait/verify cycle.
// Every phase transition is stamped so the CLI can show where an attempt
// stopped and how long each step took.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::Display;

use super::action::{ActionStatus, BluetoothAction};
use super::state::ConnectionState;

/// Recovery sequencer states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Phase {
    Idle,
    Checking,
    Disconnecting,
    WaitingAfterDisconnect,
    Reconnecting,
    WaitingAfterReconnect,
    Verifying,
    Succeeded,
    Failed,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseTransition {
    pub phase: Phase,
    pub at: DateTime<Utc>,
}

/// Why an attempt did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FailureReason {
    /// The precondition probe found no connected device.
    NotConnected { observed: ConnectionState },
    ActionFailed {
        action: BluetoothAction,
        status: ActionStatus,
        diagnostics: String,
    },
    /// Post-reconnect probing could not confirm the stereo profile.
    VerificationInconclusive { observed: ConnectionState },
    Cancelled,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected { .. } => f.write_str("not connected"),
            Self::ActionFailed {
                action,
                status,
                diagnostics,
            } => {
                write!(f, "{action} failed ({status})")?;
                let detail = diagnostics.trim();
                if !detail.is_empty() {
                    write!(f, ": {detail}")?;
                }
                Ok(())
            }
            Self::VerificationInconclusive { observed } => {
                write!(f, "verification inconclusive (observed {observed})")
            }
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AttemptOutcome {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoveryAttempt {
    /// 1-based ordinal.
    pub number: u32,
    pub transitions: Vec<PhaseTransition>,
    pub outcome: AttemptOutcome,
    pub failure: Option<FailureReason>,
    /// State observed by the final probe of this attempt.
    pub final_state: ConnectionState,
}

impl RecoveryAttempt {
    pub(crate) fn start(number: u32) -> Self {
        let mut attempt = Self {
            number,
            transitions: Vec::new(),
            outcome: AttemptOutcome::Failed,
            failure: None,
            final_state: ConnectionState::Unknown,
        };
        attempt.enter(Phase::Idle);
        attempt
    }

    pub(crate) fn enter(&mut self, phase: Phase) {
        self.transitions.push(PhaseTransition {
            phase,
            at: Utc::now(),
        });
    }

    pub(crate) fn succeed(mut self, observed: ConnectionState) -> Self {
        self.final_state = observed;
        self.outcome = AttemptOutcome::Succeeded;
        self.enter(Phase::Succeeded);
        self
    }

    pub(crate) fn fail(mut self, reason: FailureReason) -> Self {
        if let FailureReason::NotConnected { observed }
        | FailureReason::VerificationInconclusive { observed } = &reason
        {
            self.final_state = *observed;
        }
        self.failure = Some(reason);
        self.outcome = AttemptOutcome::Failed;
        self.enter(Phase::Failed);
        self
    }

    pub fn succeeded(&self) -> bool {
        self.outcome == AttemptOutcome::Succeeded
    }

    /// Phases in the order they were entered.
    pub fn phases(&self) -> Vec<Phase> {
        self.transitions.iter().map(|t| t.phase).collect()
    }

    /// Whether retrying the cycle cannot change the result.
    pub fn is_final(&self) -> bool {
        matches!(
            self.failure,
            Some(FailureReason::NotConnected { .. } | FailureReason::Cancelled)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempt_records_terminal_phase() {
        let mut attempt = RecoveryAttempt::start(1);
        attempt.enter(Phase::Checking);
        let attempt = attempt.fail(FailureReason::NotConnected {
            observed: ConnectionState::Disconnected,
        });

        assert_eq!(
            attempt.phases(),
            vec![Phase::Idle, Phase::Checking, Phase::Failed]
        );
        assert_eq!(attempt.final_state, ConnectionState::Disconnected);
        assert!(attempt.is_final());
        assert!(!attempt.succeeded());
    }

    #[test]
    fn action_failure_message_includes_diagnostics() {
        let reason = FailureReason::ActionFailed {
            action: BluetoothAction::Disconnect,
            status: ActionStatus::ExecutionFailed,
            diagnostics: "Device not found\n".into(),
        };
        assert_eq!(
            reason.to_string(),
            "disconnect failed (execution-failed): Device not found"
        );
    }
}
