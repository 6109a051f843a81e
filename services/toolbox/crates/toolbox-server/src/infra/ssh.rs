//! `RemoteExecutor` over the OpenSSH client.
//!
//! Every call spawns its own `ssh` process: no session is shared between
//! calls, so one call's failure cannot poison the next. Host key checking is
//! left to the client configuration (`accept-new` pins on first contact).

use std::time::Duration;

use confgate_common::ToolboxConfig;

use crate::application::ports::{CommandRunner, RemoteExecutor};
use crate::domain::shell::{in_directory, quote};
use crate::domain::{ExecOutput, RemoteError};
use crate::infra::command_runner::CommandTimeout;

/// Client binary.
pub const SSH_PROGRAM: &str = "ssh";

/// Exit status the OpenSSH client reserves for its own failures.
pub const SSH_TRANSPORT_FAILURE: i32 = 255;

/// Where and how to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    pub host: String,
    pub user: String,
    pub port: u16,
    pub key_path: Option<String>,
    pub connect_timeout: Duration,
}

impl SshTarget {
    #[must_use]
    pub fn from_config(config: &ToolboxConfig) -> Self {
        Self {
            host: config.ssh_host.trim().to_string(),
            user: config.ssh_user.clone(),
            port: config.ssh_port,
            key_path: config.ssh_key_path.clone(),
            connect_timeout: config.connect_timeout(),
        }
    }

    /// Full `ssh` argument list running `remote_command` on the target.
    #[must_use]
    pub fn args(&self, remote_command: &str) -> Vec<String> {
        let mut args = vec![
            "-T".to_string(),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout.as_secs().max(1)),
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
            "-p".to_string(),
            self.port.to_string(),
        ];
        if let Some(key) = &self.key_path {
            args.push("-i".to_string());
            args.push(key.clone());
        }
        args.push(format!("{}@{}", self.user, self.host));
        args.push("--".to_string());
        args.push(remote_command.to_string());
        args
    }
}

/// Production [`RemoteExecutor`].
pub struct SshExecutor<R> {
    target: SshTarget,
    runner: R,
    command_timeout: Duration,
}

impl<R: CommandRunner> SshExecutor<R> {
    #[must_use]
    pub fn new(target: SshTarget, runner: R, command_timeout: Duration) -> Self {
        Self {
            target,
            runner,
            command_timeout,
        }
    }

    #[must_use]
    pub fn runner(&self) -> &R {
        &self.runner
    }

    async fn invoke(
        &self,
        remote_command: &str,
        stdin: Option<&[u8]>,
    ) -> Result<std::process::Output, Invocation> {
        let args = self.target.args(remote_command);
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();

        let result = match stdin {
            Some(input) => {
                self.runner
                    .run_with_stdin(SSH_PROGRAM, &arg_refs, input, self.command_timeout)
                    .await
            }
            None => {
                self.runner
                    .run_with_timeout(SSH_PROGRAM, &arg_refs, self.command_timeout)
                    .await
            }
        };

        match result {
            Ok(output) if output.status.code() == Some(SSH_TRANSPORT_FAILURE) => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                Err(Invocation::Connection(stderr))
            }
            Ok(output) => Ok(output),
            Err(e) if e.downcast_ref::<CommandTimeout>().is_some() => {
                Err(Invocation::TimedOut(e.to_string()))
            }
            Err(e) => Err(Invocation::Connection(format!("{e:#}"))),
        }
    }
}

/// Outcome of spawning `ssh` before the remote result is interpreted.
enum Invocation {
    Connection(String),
    TimedOut(String),
}

impl Invocation {
    fn for_command(self) -> RemoteError {
        match self {
            Self::Connection(detail) => RemoteError::Connection(detail),
            Self::TimedOut(detail) => RemoteError::Execution(detail),
        }
    }

    fn for_file(self, path: &str) -> RemoteError {
        match self {
            Self::Connection(detail) => RemoteError::Connection(detail),
            Self::TimedOut(detail) => RemoteError::RemoteIo {
                path: path.to_string(),
                detail,
            },
        }
    }
}

impl<R: CommandRunner> RemoteExecutor for SshExecutor<R> {
    async fn run(
        &self,
        command: &str,
        working_dir: Option<&str>,
    ) -> Result<ExecOutput, RemoteError> {
        let full = in_directory(working_dir, command);
        tracing::debug!(host = %self.target.host, command = %full, "remote exec");

        let output = self
            .invoke(&full, None)
            .await
            .map_err(Invocation::for_command)?;

        Ok(ExecOutput::new(
            &String::from_utf8_lossy(&output.stdout),
            &String::from_utf8_lossy(&output.stderr),
            output.status.code(),
        ))
    }

    async fn read_file(&self, path: &str) -> Result<String, RemoteError> {
        let command = format!("cat -- {}", quote(path));
        let output = self
            .invoke(&command, None)
            .await
            .map_err(|e| e.for_file(path))?;

        if !output.status.success() {
            return Err(RemoteError::RemoteIo {
                path: path.to_string(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        String::from_utf8(output.stdout).map_err(|_| RemoteError::RemoteIo {
            path: path.to_string(),
            detail: "file is not valid UTF-8".to_string(),
        })
    }

    async fn write_file(&self, path: &str, content: &str) -> Result<(), RemoteError> {
        let command = format!("cat > {}", quote(path));
        tracing::debug!(host = %self.target.host, path, bytes = content.len(), "remote write");

        let output = self
            .invoke(&command, Some(content.as_bytes()))
            .await
            .map_err(|e| e.for_file(path))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(RemoteError::RemoteIo {
                path: path.to_string(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}
