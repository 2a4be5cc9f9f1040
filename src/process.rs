//! OS process spawning.
//!
//! Launch commands are full shell command lines, so they run through the
//! platform shell. Terminal openers either return quickly (`start`, `open`,
//! `gnome-terminal`) or stay in the foreground for as long as the window is
//! open (`alacritty`, `kitty`). The spawner waits a short grace window: an
//! exit inside the window is reported with its status, a process still
//! running afterwards is treated as launched and left alone. Requests built
//! with [`SpawnRequest::wait_for_exit`] skip the grace window and always
//! report the real exit status.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, Command};

/// How long to wait for an opener to exit before treating it as launched.
const SPAWN_GRACE_PERIOD: Duration = Duration::from_millis(750);

/// Upper bound for requests that wait for the process to exit.
const EXIT_WAIT_LIMIT: Duration = Duration::from_secs(30);

const STDERR_READ_TIMEOUT: Duration = Duration::from_millis(200);

/// Maximum stderr bytes to include in error messages.
const MAX_STDERR_BYTES: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRequest {
    pub command_line: String,
    pub cwd: Option<PathBuf>,
    /// Wait for the process to exit instead of detaching after the grace window
    pub wait_for_exit: bool,
}

impl SpawnRequest {
    pub fn new(command_line: impl Into<String>) -> Self {
        Self { command_line: command_line.into(), cwd: None, wait_for_exit: false }
    }

    pub fn in_dir(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn wait_for_exit(mut self) -> Self {
        self.wait_for_exit = true;
        self
    }
}

/// Whether the spawned process finished within the grace window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnOutcome {
    Exited,
    Detached,
}

#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    #[error("failed to start shell: {0}")]
    Io(#[from] std::io::Error),
    #[error("command exited with {status}{}", format_stderr(.stderr))]
    Failed { status: String, stderr: String },
}

fn format_stderr(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

#[async_trait]
pub trait ProcessSpawner: Send + Sync {
    async fn spawn(&self, request: SpawnRequest) -> Result<SpawnOutcome, SpawnError>;
}

/// Runs command lines through `sh -c` or `cmd /C`.
#[derive(Debug, Default, Clone)]
pub struct ShellSpawner;

impl ShellSpawner {
    fn shell_command(command_line: &str) -> Command {
        #[cfg(windows)]
        {
            let mut cmd = Command::new("cmd");
            // Hand the line over verbatim; Rust's argument quoting would
            // re-escape the quotes cmd.exe is supposed to interpret.
            cmd.raw_arg("/C").raw_arg(command_line);
            cmd
        }
        #[cfg(not(windows))]
        {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command_line);
            cmd
        }
    }
}

#[async_trait]
impl ProcessSpawner for ShellSpawner {
    async fn spawn(&self, request: SpawnRequest) -> Result<SpawnOutcome, SpawnError> {
        let mut cmd = Self::shell_command(&request.command_line);
        if let Some(cwd) = &request.cwd {
            cmd.current_dir(cwd);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        tracing::debug!(command = %request.command_line, cwd = ?request.cwd, "spawning");
        let mut child = cmd.spawn()?;
        let mut stderr = child.stderr.take();

        if request.wait_for_exit {
            let waited = tokio::time::timeout(EXIT_WAIT_LIMIT, wait_with_stderr(&mut child, stderr)).await;
            return match waited {
                Ok(result) => {
                    let (status, captured) = result?;
                    check_status(status, captured)
                }
                Err(_) => {
                    let _ = child.start_kill();
                    Err(SpawnError::Failed {
                        status: format!("no exit after {}s", EXIT_WAIT_LIMIT.as_secs()),
                        stderr: String::new(),
                    })
                }
            };
        }

        match tokio::time::timeout(SPAWN_GRACE_PERIOD, child.wait()).await {
            Ok(status) => {
                let status = status?;
                let mut captured = String::new();
                if let Some(pipe) = stderr.as_mut() {
                    let mut buf = Vec::new();
                    // A grandchild (e.g. the window behind `start`) may have
                    // inherited the pipe and keep it open; take what is there.
                    let _ = tokio::time::timeout(STDERR_READ_TIMEOUT, pipe.read_to_end(&mut buf)).await;
                    captured = truncate_stderr(&buf);
                }
                check_status(status, captured)
            }
            Err(_) => {
                // Keep draining stderr so the opener never blocks on a full pipe.
                tokio::spawn(async move {
                    if let Some(mut pipe) = stderr {
                        let mut sink = Vec::new();
                        let _ = pipe.read_to_end(&mut sink).await;
                    }
                    match child.wait().await {
                        Ok(status) => tracing::debug!(%status, "detached opener exited"),
                        Err(e) => tracing::debug!("detached opener wait failed: {e}"),
                    }
                });
                Ok(SpawnOutcome::Detached)
            }
        }
    }
}

/// Wait for exit while draining stderr, so a chatty process cannot block on a
/// full pipe.
async fn wait_with_stderr(
    child: &mut Child,
    stderr: Option<ChildStderr>,
) -> std::io::Result<(ExitStatus, String)> {
    let read = async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = stderr {
            let _ = pipe.read_to_end(&mut buf).await;
        }
        buf
    };
    let (status, buf) = tokio::join!(child.wait(), read);
    Ok((status?, truncate_stderr(&buf)))
}

fn check_status(status: ExitStatus, stderr: String) -> Result<SpawnOutcome, SpawnError> {
    if status.success() {
        Ok(SpawnOutcome::Exited)
    } else {
        Err(SpawnError::Failed { status: status.to_string(), stderr })
    }
}

fn truncate_stderr(bytes: &[u8]) -> String {
    let end = bytes.len().min(MAX_STDERR_BYTES);
    String::from_utf8_lossy(&bytes[..end]).trim().to_string()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Records every request; answers with queued results, then `Exited`.
    #[derive(Default)]
    pub(crate) struct RecordingSpawner {
        pub(crate) requests: Mutex<Vec<SpawnRequest>>,
        pub(crate) failures: Mutex<VecDeque<Option<String>>>,
    }

    impl RecordingSpawner {
        /// Queue the outcome of the next spawn: `Some(stderr)` fails it.
        pub(crate) fn push_result(&self, failure: Option<&str>) {
            self.failures.lock().push_back(failure.map(str::to_string));
        }

        pub(crate) fn command_lines(&self) -> Vec<String> {
            self.requests.lock().iter().map(|r| r.command_line.clone()).collect()
        }
    }

    #[async_trait]
    impl ProcessSpawner for RecordingSpawner {
        async fn spawn(&self, request: SpawnRequest) -> Result<SpawnOutcome, SpawnError> {
            self.requests.lock().push(request);
            match self.failures.lock().pop_front().flatten() {
                Some(stderr) => Err(SpawnError::Failed { status: "exit status: 1".into(), stderr }),
                None => Ok(SpawnOutcome::Exited),
            }
        }
    }

    #[test]
    fn request_builder_sets_cwd() {
        let req = SpawnRequest::new("echo hi").in_dir("/tmp");
        assert_eq!(req.command_line, "echo hi");
        assert_eq!(req.cwd, Some(PathBuf::from("/tmp")));
        assert!(!req.wait_for_exit);
        assert!(req.wait_for_exit().wait_for_exit);
    }

    #[test]
    fn failed_error_includes_stderr() {
        let err = SpawnError::Failed { status: "exit status: 2".into(), stderr: "boom".into() };
        assert_eq!(err.to_string(), "command exited with exit status: 2: boom");
        let err = SpawnError::Failed { status: "exit status: 2".into(), stderr: String::new() };
        assert_eq!(err.to_string(), "command exited with exit status: 2");
    }

    #[test]
    fn stderr_is_truncated() {
        let long = vec![b'x'; MAX_STDERR_BYTES * 2];
        assert_eq!(truncate_stderr(&long).len(), MAX_STDERR_BYTES);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn shell_spawner_reports_success() {
        let outcome = ShellSpawner.spawn(SpawnRequest::new("true")).await.unwrap();
        assert_eq!(outcome, SpawnOutcome::Exited);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn shell_spawner_reports_failure_with_stderr() {
        let err = ShellSpawner
            .spawn(SpawnRequest::new("echo nope >&2; exit 3"))
            .await
            .unwrap_err();
        match err {
            SpawnError::Failed { stderr, .. } => assert_eq!(stderr, "nope"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn shell_spawner_runs_in_cwd() {
        let dir = tempfile::TempDir::new().unwrap();
        let marker = dir.path().join("here");
        let outcome = ShellSpawner
            .spawn(SpawnRequest::new("touch here").in_dir(dir.path()))
            .await
            .unwrap();
        assert_eq!(outcome, SpawnOutcome::Exited);
        assert!(marker.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn long_running_opener_is_detached() {
        let outcome = ShellSpawner.spawn(SpawnRequest::new("sleep 5")).await.unwrap();
        assert_eq!(outcome, SpawnOutcome::Detached);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn waiting_request_reports_late_failure() {
        let err = ShellSpawner
            .spawn(SpawnRequest::new("sleep 1; echo denied >&2; exit 1").wait_for_exit())
            .await
            .unwrap_err();
        match err {
            SpawnError::Failed { stderr, .. } => assert_eq!(stderr, "denied"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn waiting_request_reports_late_success_as_exited() {
        let outcome = ShellSpawner
            .spawn(SpawnRequest::new("sleep 1").wait_for_exit())
            .await
            .unwrap();
        assert_eq!(outcome, SpawnOutcome::Exited);
    }
}
