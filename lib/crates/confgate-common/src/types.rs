use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ChangeId;

/// Kinds of staged change the toolbox knows how to apply.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeKind {
    /// Overwrite a service configuration file, check it, then reload the service.
    ReplaceConfigFile,
}

impl ChangeKind {
    /// Every supported kind, in declaration order.
    pub const ALL: &'static [ChangeKind] = &[ChangeKind::ReplaceConfigFile];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ChangeKind::ReplaceConfigFile => "replace-config-file",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChangeKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown change kind '{s}'"))
    }
}

/// Read-only view of a pending change. Never carries the proposed content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeSummary {
    pub id: ChangeId,
    /// Kind as proposed; may name a kind this build cannot apply.
    pub kind: String,
    pub target_path: String,
    pub content_bytes: usize,
    pub proposed_at: DateTime<Utc>,
}

/// Why an apply attempt did not complete.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApplyFailure {
    NotFound,
    UnsupportedKind,
    CommitFailed,
    ValidateFailed,
    ActivateFailed,
}

impl ApplyFailure {
    /// Wire name, matching the serde representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ApplyFailure::NotFound => "not_found",
            ApplyFailure::UnsupportedKind => "unsupported_kind",
            ApplyFailure::CommitFailed => "commit_failed",
            ApplyFailure::ValidateFailed => "validate_failed",
            ApplyFailure::ActivateFailed => "activate_failed",
        }
    }
}

impl fmt::Display for ApplyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /changes/{id}/apply`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyRequest {
    /// Container running the service to check and reload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
}

/// Result of an apply attempt as reported to agents and operators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ApplyResponse {
    Applied {
        change_id: String,
        target_path: String,
        message: String,
    },
    Failed {
        change_id: String,
        reason: ApplyFailure,
        message: String,
    },
}

impl ApplyResponse {
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, ApplyResponse::Applied { .. })
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            ApplyResponse::Applied { message, .. } | ApplyResponse::Failed { message, .. } => {
                message
            }
        }
    }
}
