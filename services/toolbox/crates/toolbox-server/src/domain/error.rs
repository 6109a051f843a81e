//! Typed domain error enums.
//!
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use confgate_common::ApplyFailure;
use thiserror::Error;

// ── Remote executor errors ────────────────────────────────────────────────────

/// Failures surfaced by a remote executor. Never retried internally.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// The transport session could not be established.
    #[error("failed to establish SSH connection: {0}")]
    Connection(String),

    /// The command ran but failed, or did not finish within the timeout.
    #[error("remote command failed: {0}")]
    Execution(String),

    /// Reading or writing a remote file failed.
    #[error("remote file I/O failed for '{path}': {detail}")]
    RemoteIo { path: String, detail: String },
}

// ── Atomic replace errors ─────────────────────────────────────────────────────

/// Failures of the atomic file replacer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReplaceError {
    #[error("failed to write temporary file {temp_path}: {source}")]
    Write {
        temp_path: String,
        #[source]
        source: RemoteError,
    },

    #[error("failed to move {temp_path} onto {target_path}: {detail}")]
    Move {
        temp_path: String,
        target_path: String,
        detail: String,
    },
}

// ── Apply errors ──────────────────────────────────────────────────────────────

/// Why `apply` stopped. Each stage failure names the stage and keeps the detail.
///
/// A validate or activate failure leaves the committed file in place.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("No pending change found with ID '{id}'.")]
    NotFound { id: String },

    #[error("Unknown or unhandled change kind '{kind}'.")]
    UnsupportedKind { kind: String },

    #[error("Failed to commit {target_path}: {source}")]
    CommitFailed {
        target_path: String,
        #[source]
        source: ReplaceError,
    },

    #[error("{target_path} updated, but validation failed: {detail}")]
    ValidateFailed { target_path: String, detail: String },

    #[error("{target_path} updated and validated, but activation failed: {detail}")]
    ActivateFailed { target_path: String, detail: String },
}

impl ApplyError {
    /// Wire-level classification of this error.
    #[must_use]
    pub fn failure(&self) -> ApplyFailure {
        match self {
            ApplyError::NotFound { .. } => ApplyFailure::NotFound,
            ApplyError::UnsupportedKind { .. } => ApplyFailure::UnsupportedKind,
            ApplyError::CommitFailed { .. } => ApplyFailure::CommitFailed,
            ApplyError::ValidateFailed { .. } => ApplyFailure::ValidateFailed,
            ApplyError::ActivateFailed { .. } => ApplyFailure::ActivateFailed,
        }
    }
}

// ── Input errors ──────────────────────────────────────────────────────────────

/// Rejected tool or API input, detected before any remote call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("invalid {field} '{value}': must match ^[A-Za-z0-9][A-Za-z0-9_.-]{{0,127}}$")]
    InvalidName { field: &'static str, value: String },

    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("invalid compose action '{0}': expected up, down, restart, or pull")]
    InvalidComposeAction(String),
}
