//! Shared mock infrastructure for unit tests.
//!
//! [`FakeHost`] is an in-memory remote host: it keeps a file table, records
//! every command and write, understands the handful of commands the change
//! pipeline issues (`mv`, `rm`, `nginx -t`, `nginx -s reload`), and can be
//! scripted to fail any of them. [`RecordingRunner`] stands in for the local
//! process runner underneath the SSH executor.

#![allow(clippy::expect_used)]

use std::collections::{HashMap, VecDeque};
use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Output};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use confgate_toolbox::application::ports::{CommandRunner, RemoteExecutor};
use confgate_toolbox::domain::{ExecOutput, RemoteError};
use confgate_toolbox::infra::CommandTimeout;

// ── Output helpers ────────────────────────────────────────────────────────────

pub fn exit_status(code: i32) -> ExitStatus {
    ExitStatus::from_raw(code << 8)
}

pub fn exec_ok(stdout: &str) -> ExecOutput {
    ExecOutput::new(stdout, "", Some(0))
}

pub fn exec_failed(stderr: &str, code: i32) -> ExecOutput {
    ExecOutput::new("", stderr, Some(code))
}

pub const NGINX_TEST_OK: &str = "nginx: the configuration file /etc/nginx/nginx.conf syntax is ok\n\
     nginx: configuration file /etc/nginx/nginx.conf test is successful";

pub const NGINX_TEST_FAILED: &str =
    "nginx: [emerg] unexpected \"}\" in /etc/nginx/conf.d/app.conf:12\n\
     nginx: configuration file /etc/nginx/nginx.conf test failed";

// ── Mock: in-memory remote host ───────────────────────────────────────────────

/// How the next `write_file` call misbehaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteFault {
    /// Fails before anything is created.
    Refused,
    /// Creates a truncated file, then fails.
    Partial,
}

#[derive(Default)]
pub struct FakeHost {
    files: Mutex<HashMap<String, String>>,
    commands: Mutex<Vec<String>>,
    writes: Mutex<Vec<String>>,
    scripted: Mutex<Vec<(String, Result<ExecOutput, RemoteError>)>>,
    write_fault: Mutex<Option<WriteFault>>,
    watched: Mutex<Option<String>>,
    observations: Mutex<Vec<Option<String>>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(path: &str, content: &str) -> Self {
        let host = Self::new();
        host.put_file(path, content);
        host
    }

    pub fn put_file(&self, path: &str, content: &str) {
        self.files
            .lock()
            .expect("lock")
            .insert(path.to_string(), content.to_string());
    }

    pub fn file(&self, path: &str) -> Option<String> {
        self.files.lock().expect("lock").get(path).cloned()
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.files.lock().expect("lock").keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Every command line passed to `run`, in order.
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().expect("lock").clone()
    }

    pub fn ran(&self, needle: &str) -> bool {
        self.commands().iter().any(|c| c.contains(needle))
    }

    /// Every path passed to `write_file`, in order.
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().expect("lock").clone()
    }

    pub fn remote_calls(&self) -> usize {
        self.commands.lock().expect("lock").len() + self.writes.lock().expect("lock").len()
    }

    /// Any command containing `needle` returns `result` instead of the
    /// built-in behaviour. Earlier scripts win.
    pub fn script(&self, needle: &str, result: Result<ExecOutput, RemoteError>) {
        self.scripted
            .lock()
            .expect("lock")
            .push((needle.to_string(), result));
    }

    pub fn fail_next_write(&self, fault: WriteFault) {
        *self.write_fault.lock().expect("lock") = Some(fault);
    }

    /// Record the content of `path` after every remote operation.
    pub fn watch(&self, path: &str) {
        *self.watched.lock().expect("lock") = Some(path.to_string());
    }

    pub fn observations(&self) -> Vec<Option<String>> {
        self.observations.lock().expect("lock").clone()
    }

    fn observe(&self) {
        let watched = self.watched.lock().expect("lock").clone();
        if let Some(path) = watched {
            let content = self.file(&path);
            self.observations.lock().expect("lock").push(content);
        }
    }

    fn builtin(&self, command: &str) -> ExecOutput {
        let words: Vec<&str> = command.split_whitespace().collect();
        match words.as_slice() {
            ["sudo", "mv", "--", from, to] => {
                let mut files = self.files.lock().expect("lock");
                match files.remove(*from) {
                    Some(content) => {
                        files.insert((*to).to_string(), content);
                        exec_ok("")
                    }
                    None => exec_failed(
                        &format!("mv: cannot stat '{from}': No such file or directory"),
                        1,
                    ),
                }
            }
            ["rm", "-f", "--", path] => {
                self.files.lock().expect("lock").remove(*path);
                exec_ok("")
            }
            [.., "nginx", "-t"] => ExecOutput::new("", NGINX_TEST_OK, Some(0)),
            [.., "nginx", "-s", "reload"] => exec_ok(""),
            _ => exec_ok(""),
        }
    }
}

impl RemoteExecutor for FakeHost {
    async fn run(
        &self,
        command: &str,
        working_dir: Option<&str>,
    ) -> Result<ExecOutput, RemoteError> {
        let full = match working_dir {
            Some(dir) => format!("cd {dir} && {command}"),
            None => command.to_string(),
        };
        self.commands.lock().expect("lock").push(full.clone());

        let scripted = self
            .scripted
            .lock()
            .expect("lock")
            .iter()
            .find(|(needle, _)| full.contains(needle.as_str()))
            .map(|(_, result)| result.clone());

        let result = match scripted {
            Some(result) => result,
            None => Ok(self.builtin(command)),
        };
        self.observe();
        result
    }

    async fn read_file(&self, path: &str) -> Result<String, RemoteError> {
        self.file(path).ok_or_else(|| RemoteError::RemoteIo {
            path: path.to_string(),
            detail: "No such file".to_string(),
        })
    }

    async fn write_file(&self, path: &str, content: &str) -> Result<(), RemoteError> {
        self.writes.lock().expect("lock").push(path.to_string());
        let fault = self.write_fault.lock().expect("lock").take();
        let result = match fault {
            None => {
                self.put_file(path, content);
                Ok(())
            }
            Some(WriteFault::Refused) => Err(RemoteError::RemoteIo {
                path: path.to_string(),
                detail: "Permission denied".to_string(),
            }),
            Some(WriteFault::Partial) => {
                let cut = content.len() / 2;
                self.put_file(path, content.get(..cut).unwrap_or_default());
                Err(RemoteError::RemoteIo {
                    path: path.to_string(),
                    detail: "No space left on device".to_string(),
                })
            }
        };
        self.observe();
        result
    }
}

// ── Mock: recording local process runner ─────────────────────────────────────

/// Canned reply for one [`RecordingRunner`] call.
pub enum Reply {
    Exit {
        code: i32,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
    },
    TimedOut,
    SpawnFailed,
}

impl Reply {
    pub fn ok(stdout: &str) -> Self {
        Self::Exit {
            code: 0,
            stdout: stdout.as_bytes().to_vec(),
            stderr: Vec::new(),
        }
    }

    pub fn exit(code: i32, stderr: &str) -> Self {
        Self::Exit {
            code,
            stdout: Vec::new(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerCall {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<Vec<u8>>,
    pub timeout: Option<Duration>,
}

impl RunnerCall {
    /// The remote command: the argument after `--`.
    pub fn remote_command(&self) -> &str {
        self.args.last().map_or("", String::as_str)
    }
}

/// Replays queued replies and records every call. An empty queue replies
/// with a successful, silent exit.
#[derive(Default)]
pub struct RecordingRunner {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<RunnerCall>>,
}

impl RecordingRunner {
    pub fn replying(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RunnerCall> {
        self.calls.lock().expect("lock").clone()
    }

    fn answer(
        &self,
        program: &str,
        args: &[&str],
        stdin: Option<&[u8]>,
        timeout: Option<Duration>,
    ) -> Result<Output> {
        self.calls.lock().expect("lock").push(RunnerCall {
            program: program.to_string(),
            args: args.iter().map(ToString::to_string).collect(),
            stdin: stdin.map(<[u8]>::to_vec),
            timeout,
        });
        let reply = self
            .replies
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| Reply::ok(""));
        match reply {
            Reply::Exit {
                code,
                stdout,
                stderr,
            } => Ok(Output {
                status: exit_status(code),
                stdout,
                stderr,
            }),
            Reply::TimedOut => Err(CommandTimeout {
                program: program.to_string(),
                secs: timeout.map_or(60, |t| t.as_secs()),
            }
            .into()),
            Reply::SpawnFailed => {
                Err(anyhow::anyhow!("No such file or directory (os error 2)")
                    .context(format!("failed to spawn {program}")))
            }
        }
    }
}

impl CommandRunner for RecordingRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.answer(program, args, None, None)
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output> {
        self.answer(program, args, None, Some(timeout))
    }

    async fn run_with_stdin(
        &self,
        program: &str,
        args: &[&str],
        input: &[u8],
        timeout: Duration,
    ) -> Result<Output> {
        self.answer(program, args, Some(input), Some(timeout))
    }
}
