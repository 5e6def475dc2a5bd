// ── Action executor ──
//
// The only code that mutates Bluetooth state. Each operation issues
// exactly one control-tool call and classifies the outcome; nothing here
// retries. A dry run still checks that the tool is installed.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::model::{ActionResult, ActionStatus, BluetoothAction, MacAddress};
use crate::probe::FormatCache;
use crate::runner::{CommandOutput, CommandRunner, CommandStatus};

pub struct ActionExecutor {
    runner: Arc<dyn CommandRunner>,
    program: String,
    timeout: Duration,
    formats: Arc<FormatCache>,
    dry_run: bool,
}

impl ActionExecutor {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        program: impl Into<String>,
        timeout: Duration,
        formats: Arc<FormatCache>,
        dry_run: bool,
    ) -> Self {
        Self {
            runner,
            program: program.into(),
            timeout,
            formats,
            dry_run,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub async fn disconnect(&self, address: &MacAddress) -> ActionResult {
        self.execute(BluetoothAction::Disconnect, address).await
    }

    pub async fn connect(&self, address: &MacAddress) -> ActionResult {
        self.execute(BluetoothAction::Connect, address).await
    }

    async fn execute(&self, action: BluetoothAction, address: &MacAddress) -> ActionResult {
        let rendered = self.formats.preferred(address);
        let flag = match action {
            BluetoothAction::Disconnect => "--disconnect",
            BluetoothAction::Connect => "--connect",
        };

        if !self.runner.is_available(&self.program) {
            warn!(program = %self.program, %action, "control tool not installed");
            return ActionResult {
                action,
                status: ActionStatus::ToolMissing,
                diagnostics: format!("{} not installed", self.program),
                dry_run: self.dry_run,
            };
        }

        if self.dry_run {
            info!("[dry-run] would run: {} {flag} {rendered}", self.program);
            return ActionResult {
                action,
                status: ActionStatus::Success,
                diagnostics: format!("dry run: {} {flag} {rendered}", self.program),
                dry_run: true,
            };
        }

        debug!(%action, address = %rendered, "issuing bluetooth action");
        let output = self
            .runner
            .run(&self.program, &[flag, &rendered], self.timeout)
            .await;
        let status = classify(&output);
        if !status.is_success() {
            warn!(%action, %status, diagnostics = %output.combined(), "bluetooth action failed");
        }
        ActionResult {
            action,
            status,
            diagnostics: output.combined(),
            dry_run: false,
        }
    }
}

/// Map a finished command onto the action outcome taxonomy.
pub fn classify(output: &CommandOutput) -> ActionStatus {
    match &output.status {
        CommandStatus::Exited(Some(0)) => ActionStatus::Success,
        CommandStatus::NotFound => ActionStatus::ToolMissing,
        CommandStatus::TimedOut => ActionStatus::Timeout,
        CommandStatus::Exited(_) | CommandStatus::SpawnFailed(_) => ActionStatus::ExecutionFailed,
    }
}
