//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`.
//!
//! Every async port returns a `Send` future so services built on them can be
//! driven from axum and rmcp handlers.

use std::future::Future;
use std::process::Output;
use std::time::Duration;

use anyhow::Result;
use confgate_common::ChangeSummary;

use crate::domain::{ExecOutput, RemoteError, StagedChange};

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts local process execution so infrastructure can be swapped or mocked.
pub trait CommandRunner: Send + Sync {
    /// Run a program and capture its output with the default timeout.
    fn run(&self, program: &str, args: &[&str]) -> impl Future<Output = Result<Output>> + Send;

    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> impl Future<Output = Result<Output>> + Send;

    /// Run a program with stdin piped from `input`, under the same `timeout`
    /// contract as [`CommandRunner::run_with_timeout`].
    fn run_with_stdin(
        &self,
        program: &str,
        args: &[&str],
        input: &[u8],
        timeout: Duration,
    ) -> impl Future<Output = Result<Output>> + Send;
}

// ── Remote Executor Port ──────────────────────────────────────────────────────

/// Command execution and whole-file transfer on the managed host.
///
/// Each call is independent: one call's failure never affects another.
pub trait RemoteExecutor: Send + Sync {
    /// Run `command` through the remote shell, as `cd <working_dir> && <command>`
    /// when a working directory is given.
    ///
    /// Returns the structured output whatever the exit status; judging it is
    /// left to the caller.
    ///
    /// # Errors
    ///
    /// `RemoteError::Connection` when no session could be set up,
    /// `RemoteError::Execution` when the call timed out.
    fn run(
        &self,
        command: &str,
        working_dir: Option<&str>,
    ) -> impl Future<Output = Result<ExecOutput, RemoteError>> + Send;

    /// Read a whole remote file as UTF-8 text.
    fn read_file(&self, path: &str) -> impl Future<Output = Result<String, RemoteError>> + Send;

    /// Create or truncate `path` with `content`.
    fn write_file(
        &self,
        path: &str,
        content: &str,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;
}

// ── Pending Change Store Port ─────────────────────────────────────────────────

/// Concurrency-safe table of pending changes keyed by id.
///
/// `insert` and `take` are each a single atomic step: two concurrent `take`
/// calls for the same id never both return the change.
pub trait ChangeStore: Send + Sync {
    /// Insert `change`. Hands it back if its id is already present.
    ///
    /// # Errors
    ///
    /// Returns the change unchanged when the id collides with an entry.
    fn insert(&self, change: StagedChange) -> Result<(), StagedChange>;

    /// Remove and return the change with `id`.
    fn take(&self, id: &str) -> Option<StagedChange>;

    /// Summaries of every pending change, oldest first.
    fn snapshot(&self) -> Vec<ChangeSummary>;
}
