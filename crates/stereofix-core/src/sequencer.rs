// ── Recovery sequencer ──
//
// One attempt walks Idle → Checking → Disconnecting →
// WaitingAfterDisconnect → Reconnecting → WaitingAfterReconnect →
// Verifying and ends in Succeeded or Failed. Attempts repeat under a
// bounded retry policy. Phase failures become attempt failures; nothing
// in here returns an error.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::action::ActionExecutor;
use crate::config::PhaseDurations;
use crate::model::{
    ActionResult, ConnectionState, DeviceIdentity, FailureReason, Phase, RecoveryAttempt,
};
use crate::probe::StatusProber;

/// Result of the primary recovery loop.
#[derive(Debug, Clone)]
pub struct SequenceOutcome {
    pub attempts: Vec<RecoveryAttempt>,
    pub succeeded: bool,
    /// State observed by the last probe of the last attempt.
    pub final_state: ConnectionState,
    pub cancelled: bool,
}

impl SequenceOutcome {
    pub fn attempts_used(&self) -> u32 {
        self.attempts.last().map_or(0, |a| a.number)
    }

    pub fn last_failure(&self) -> Option<&FailureReason> {
        self.attempts.last().and_then(|a| a.failure.as_ref())
    }
}

pub struct RecoverySequencer<'a> {
    prober: &'a StatusProber,
    executor: &'a ActionExecutor,
    durations: PhaseDurations,
    max_attempts: u32,
    dry_run: bool,
}

impl<'a> RecoverySequencer<'a> {
    pub fn new(
        prober: &'a StatusProber,
        executor: &'a ActionExecutor,
        durations: PhaseDurations,
        max_attempts: u32,
        dry_run: bool,
    ) -> Self {
        Self {
            prober,
            executor,
            durations,
            max_attempts,
            dry_run,
        }
    }

    /// Run up to `max_attempts` attempts, stopping at the first success.
    ///
    /// A "not connected" precondition failure or cancellation ends the
    /// loop immediately.
    pub async fn run(&self, identity: &DeviceIdentity, cancel: &CancellationToken) -> SequenceOutcome {
        let mut attempts = Vec::new();
        let mut cancelled = false;

        for number in 1..=self.max_attempts {
            let attempt = self.run_attempt(number, identity, cancel).await;
            let stop = attempt.succeeded() || attempt.is_final();
            cancelled = attempt.failure == Some(FailureReason::Cancelled);
            if let Some(reason) = &attempt.failure {
                warn!(attempt = number, %reason, "recovery attempt failed");
            }
            attempts.push(attempt);

            if stop || number == self.max_attempts {
                break;
            }
            info!(
                pause = ?self.durations.retry_pause,
                "retrying after pause"
            );
            if !pause(self.durations.retry_pause, cancel, self.dry_run).await {
                cancelled = true;
                break;
            }
        }

        let succeeded = attempts.last().is_some_and(RecoveryAttempt::succeeded);
        let final_state = attempts
            .last()
            .map_or(ConnectionState::Unknown, |a| a.final_state);
        SequenceOutcome {
            attempts,
            succeeded,
            final_state,
            cancelled,
        }
    }

    /// One full disconnect/wait/reconnect/wait/verify cycle.
    pub async fn run_attempt(
        &self,
        number: u32,
        identity: &DeviceIdentity,
        cancel: &CancellationToken,
    ) -> RecoveryAttempt {
        let mut attempt = RecoveryAttempt::start(number);
        let address = &identity.address;

        // Checking
        if cancel.is_cancelled() {
            return attempt.fail(FailureReason::Cancelled);
        }
        self.enter(&mut attempt, Phase::Checking);
        let observed = self.prober.probe(identity).await;
        attempt.final_state = observed;
        if !observed.is_connected() {
            return attempt.fail(FailureReason::NotConnected { observed });
        }

        // Disconnecting
        if cancel.is_cancelled() {
            return attempt.fail(FailureReason::Cancelled);
        }
        self.enter(&mut attempt, Phase::Disconnecting);
        let result = self.executor.disconnect(address).await;
        if !result.status.is_success() {
            return attempt.fail(action_failure(result));
        }

        self.enter(&mut attempt, Phase::WaitingAfterDisconnect);
        if !pause(self.durations.disconnect_wait, cancel, self.dry_run).await {
            return attempt.fail(FailureReason::Cancelled);
        }

        // Reconnecting
        self.enter(&mut attempt, Phase::Reconnecting);
        let result = self.executor.connect(address).await;
        if !result.status.is_success() {
            return attempt.fail(action_failure(result));
        }

        self.enter(&mut attempt, Phase::WaitingAfterReconnect);
        if !pause(self.durations.reconnect_wait, cancel, self.dry_run).await {
            return attempt.fail(FailureReason::Cancelled);
        }

        // Verifying
        self.enter(&mut attempt, Phase::Verifying);
        let observed = self.prober.probe(identity).await;
        if observed.is_restored() {
            info!(attempt = number, state = %observed, "stereo profile restored");
            attempt.succeed(observed)
        } else {
            attempt.fail(FailureReason::VerificationInconclusive { observed })
        }
    }

    fn enter(&self, attempt: &mut RecoveryAttempt, phase: Phase) {
        info!(attempt = attempt.number, %phase, dry_run = self.dry_run, "entering phase");
        attempt.enter(phase);
    }
}

fn action_failure(result: ActionResult) -> FailureReason {
    FailureReason::ActionFailed {
        action: result.action,
        status: result.status,
        diagnostics: result.diagnostics,
    }
}

/// Sleep for `duration` unless cancelled first. Dry runs skip the sleep.
///
/// Returns `false` when the token fired.
pub(crate) async fn pause(duration: Duration, cancel: &CancellationToken, dry_run: bool) -> bool {
    if dry_run || duration.is_zero() {
        return !cancel.is_cancelled();
    }
    tokio::select! {
        biased;
        () = cancel.cancelled() => false,
        () = tokio::time::sleep(duration) => true,
    }
}
