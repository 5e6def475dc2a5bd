// ── External command seam ──
//
// Every interaction with the Bluetooth/audio subsystem goes through a
// `CommandRunner`. Production code shells out via `SystemRunner`; tests
// substitute a scripted runner so the full state machine runs without
// touching real hardware.

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

/// How an external command ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandStatus {
    /// The process exited; `None` when it was killed by a signal.
    Exited(Option<i32>),
    /// The program does not exist.
    NotFound,
    /// The process outlived its timeout and was killed.
    TimedOut,
    /// The process could not be started or awaited.
    SpawnFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub status: CommandStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Exit code 0 with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Exited(Some(0)),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Non-zero exit with the given stderr.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Exited(Some(code)),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn not_found(program: &str) -> Self {
        Self {
            status: CommandStatus::NotFound,
            stdout: String::new(),
            stderr: format!("{program}: command not found"),
        }
    }

    pub fn timed_out(timeout: Duration) -> Self {
        Self {
            status: CommandStatus::TimedOut,
            stdout: String::new(),
            stderr: format!("timed out after {}s", timeout.as_secs_f32()),
        }
    }

    pub fn success(&self) -> bool {
        self.status == CommandStatus::Exited(Some(0))
    }

    /// stdout and stderr joined, trimmed, for logs and diagnostics.
    pub fn combined(&self) -> String {
        let stdout = self.stdout.trim();
        let stderr = self.stderr.trim();
        match (stdout.is_empty(), stderr.is_empty()) {
            (false, false) => format!("{stdout}\n{stderr}"),
            (false, true) => stdout.to_owned(),
            (true, false) => stderr.to_owned(),
            (true, true) => String::new(),
        }
    }
}

/// Executes external programs on behalf of the core.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Whether `program` can be found without running it.
    fn is_available(&self, program: &str) -> bool;

    /// Run `program` to completion, killing it after `timeout`.
    ///
    /// Never fails: spawn errors and timeouts are reported through
    /// [`CommandStatus`].
    async fn run(&self, program: &str, args: &[&str], timeout: Duration) -> CommandOutput;
}

// ── SystemRunner ────────────────────────────────────────────────────

/// Runs real processes via `tokio::process`.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    search_path: Option<OsString>,
}

impl SystemRunner {
    /// Resolve programs against the current `PATH`.
    pub fn new() -> Self {
        Self {
            search_path: std::env::var_os("PATH"),
        }
    }

    /// Resolve programs against an explicit search path.
    pub fn with_search_path(path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(path.into()),
        }
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// A regular file the current user could spawn.
#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path).is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[async_trait]
impl CommandRunner for SystemRunner {
    fn is_available(&self, program: &str) -> bool {
        let path = Path::new(program);
        if path.components().count() > 1 {
            return is_executable(path);
        }
        self.search_path.as_ref().is_some_and(|dirs| {
            std::env::split_paths(dirs).any(|dir| is_executable(&dir.join(program)))
        })
    }

    async fn run(&self, program: &str, args: &[&str], timeout: Duration) -> CommandOutput {
        debug!(program, ?args, "running external command");

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(ref path) = self.search_path {
            cmd.env("PATH", path);
        }

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(program, "program not found");
                return CommandOutput::not_found(program);
            }
            Err(e) => {
                warn!(program, error = %e, "failed to spawn command");
                return CommandOutput {
                    status: CommandStatus::SpawnFailed(e.to_string()),
                    stdout: String::new(),
                    stderr: e.to_string(),
                };
            }
        };

        // Dropping the future on timeout drops the child, which kills it.
        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let result = CommandOutput {
                    status: CommandStatus::Exited(output.status.code()),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                };
                debug!(program, status = ?result.status, "command finished");
                result
            }
            Ok(Err(e)) => CommandOutput {
                status: CommandStatus::SpawnFailed(e.to_string()),
                stdout: String::new(),
                stderr: e.to_string(),
            },
            Err(_) => {
                warn!(program, ?timeout, "command timed out");
                CommandOutput::timed_out(timeout)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn combined_joins_non_empty_streams() {
        let out = CommandOutput {
            status: CommandStatus::Exited(Some(1)),
            stdout: "partial\n".into(),
            stderr: "  boom ".into(),
        };
        assert_eq!(out.combined(), "partial\nboom");
        assert_eq!(CommandOutput::ok("").combined(), "");
    }

    #[test]
    fn empty_search_path_finds_nothing() {
        let runner = SystemRunner::with_search_path("");
        assert!(!runner.is_available("blueutil"));
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_file_is_not_available() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("blueutil");
        std::fs::write(&tool, "#!/bin/sh\nexit 0\n").unwrap();
        let runner = SystemRunner::with_search_path(dir.path());

        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o644)).unwrap();
        assert!(!runner.is_available("blueutil"));
        assert!(!runner.is_available(tool.to_str().unwrap()));

        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert!(runner.is_available("blueutil"));
        assert!(runner.is_available(tool.to_str().unwrap()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_command_is_killed_at_the_timeout() {
        let runner = SystemRunner::new();
        let start = std::time::Instant::now();
        let out = runner.run("sleep", &["5"], Duration::from_millis(200)).await;

        assert_eq!(out.status, CommandStatus::TimedOut);
        assert!(!out.success());
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn missing_program_reports_not_found() {
        let runner = SystemRunner::with_search_path("");
        let out = runner
            .run("stereofix-definitely-missing-tool", &[], Duration::from_secs(1))
            .await;
        assert_eq!(out.status, CommandStatus::NotFound);
        assert!(!out.success());
    }
}
