//! Command dispatch: bridges CLI args -> core orchestrator -> output formatting.

pub mod config_cmd;
pub mod discover;
pub mod fix;
pub mod status;
pub mod util;

use tokio_util::sync::CancellationToken;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a Bluetooth-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    global: &GlobalOpts,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    match cmd {
        Command::Fix(args) => fix::handle(args, global, cancel).await,
        Command::Status(args) => status::handle(args, global).await,
        Command::Discover(args) => discover::handle(args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
