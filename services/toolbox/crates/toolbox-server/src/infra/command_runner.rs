//! Infrastructure implementation of the `CommandRunner` port.
//!
//! `TokioCommandRunner` spawns local processes (in practice `ssh`) with a
//! hard deadline. A timed-out child is killed explicitly rather than left
//! running after its future is dropped.

use std::process::{Output, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Child;

use crate::application::ports::CommandRunner;

/// Default deadline for one remote call, connection setup included.
pub const DEFAULT_CMD_TIMEOUT: Duration = Duration::from_secs(60);

/// A process outlived its deadline and was killed.
///
/// Returned inside `anyhow::Error` so callers can tell a timeout from a
/// spawn failure with `downcast_ref`.
#[derive(Debug, thiserror::Error)]
#[error("{program} timed out after {secs}s")]
pub struct CommandTimeout {
    pub program: String,
    pub secs: u64,
}

/// Production `CommandRunner` backed by `tokio::process`.
pub struct TokioCommandRunner {
    timeout: Duration,
}

impl TokioCommandRunner {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for TokioCommandRunner {
    fn default() -> Self {
        Self::new(DEFAULT_CMD_TIMEOUT)
    }
}

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.run_with_timeout(program, args, self.timeout).await
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output> {
        let child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;

        wait_with_deadline(child, program, timeout).await
    }

    async fn run_with_stdin(
        &self,
        program: &str,
        args: &[&str],
        input: &[u8],
        timeout: Duration,
    ) -> Result<Output> {
        let mut child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;

        // Feed stdin concurrently with draining stdout/stderr; closing the
        // handle is what signals EOF to the remote `cat`.
        let stdin_handle = child.stdin.take();
        let input_owned = input.to_vec();
        let stdin_task = tokio::spawn(async move {
            if let Some(mut stdin) = stdin_handle {
                if let Err(e) = stdin.write_all(&input_owned).await {
                    tracing::debug!(error = %e, "stdin closed early");
                }
                drop(stdin);
            }
        });

        let output = wait_with_deadline(child, program, timeout).await;
        stdin_task.abort();
        output
    }
}

async fn wait_with_deadline(mut child: Child, program: &str, timeout: Duration) -> Result<Output> {
    let stdout_handle = child.stdout.take();
    let stderr_handle = child.stderr.take();

    tokio::select! {
        result = async {
            let (status, stdout, stderr) = tokio::join!(
                child.wait(),
                drain(stdout_handle),
                drain(stderr_handle),
            );
            Ok::<_, anyhow::Error>(Output {
                status: status.with_context(|| format!("waiting for {program}"))?,
                stdout,
                stderr,
            })
        } => result,
        () = tokio::time::sleep(timeout) => {
            if let Err(e) = child.kill().await {
                tracing::warn!(program, error = %e, "failed to kill timed-out process");
            }
            Err(CommandTimeout {
                program: program.to_string(),
                secs: timeout.as_secs(),
            }
            .into())
        }
    }
}

async fn drain<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = h.read_to_end(&mut buf).await;
    }
    buf
}
