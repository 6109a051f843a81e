//! Pending change model.
//!
//! A change is a closed enum with one variant per kind; each variant carries
//! exactly the fields its apply pipeline needs. Kinds this build does not know
//! are kept as [`PendingChange::Unsupported`] so that `apply` can reject them
//! without running any stage.

use chrono::{DateTime, Utc};
use confgate_common::{ChangeId, ChangeKind, ChangeSummary};

use crate::domain::shell::quote;

/// Phrases `nginx -t` prints when the configuration is acceptable.
pub const VALIDATION_SUCCESS_PHRASES: &[&str] = &["syntax is ok", "test is successful"];

/// Default container running the service whose config is replaced.
pub const DEFAULT_CONTAINER: &str = "nginx";

/// Full replacement of one configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFileReplacement {
    pub target_path: String,
    pub content: String,
}

/// A proposal whose kind has no pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedChange {
    pub kind: String,
    pub target_path: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingChange {
    ReplaceConfigFile(ConfigFileReplacement),
    Unsupported(UnsupportedChange),
}

impl PendingChange {
    /// Build a change from the free-form fields of a proposal.
    #[must_use]
    pub fn from_proposal(kind: &str, target_path: &str, content: &str) -> Self {
        match kind.parse::<ChangeKind>() {
            Ok(ChangeKind::ReplaceConfigFile) => {
                PendingChange::ReplaceConfigFile(ConfigFileReplacement {
                    target_path: target_path.to_string(),
                    content: content.to_string(),
                })
            }
            Err(_) => PendingChange::Unsupported(UnsupportedChange {
                kind: kind.to_string(),
                target_path: target_path.to_string(),
                content: content.to_string(),
            }),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            PendingChange::ReplaceConfigFile(_) => ChangeKind::ReplaceConfigFile.as_str(),
            PendingChange::Unsupported(change) => &change.kind,
        }
    }

    #[must_use]
    pub fn target_path(&self) -> &str {
        match self {
            PendingChange::ReplaceConfigFile(change) => &change.target_path,
            PendingChange::Unsupported(change) => &change.target_path,
        }
    }

    #[must_use]
    pub fn content_len(&self) -> usize {
        match self {
            PendingChange::ReplaceConfigFile(change) => change.content.len(),
            PendingChange::Unsupported(change) => change.content.len(),
        }
    }
}

/// A change held in the pending table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedChange {
    pub id: ChangeId,
    pub proposed_at: DateTime<Utc>,
    pub change: PendingChange,
}

impl StagedChange {
    #[must_use]
    pub fn summary(&self) -> ChangeSummary {
        ChangeSummary {
            id: self.id.clone(),
            kind: self.change.kind().to_string(),
            target_path: self.change.target_path().to_string(),
            content_bytes: self.change.content_len(),
            proposed_at: self.proposed_at,
        }
    }
}

/// Parameters supplied at apply time for the validate and activate stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationParams {
    /// Container running nginx.
    pub container: String,
}

impl Default for ActivationParams {
    fn default() -> Self {
        Self {
            container: DEFAULT_CONTAINER.to_string(),
        }
    }
}

impl ActivationParams {
    #[must_use]
    pub fn for_container(container: &str) -> Self {
        Self {
            container: container.to_string(),
        }
    }

    /// Built-in syntax check of the governing service.
    #[must_use]
    pub fn validate_command(&self) -> String {
        format!("sudo docker exec {} nginx -t", quote(&self.container))
    }

    /// Reload that makes the service pick up the committed file.
    #[must_use]
    pub fn reload_command(&self) -> String {
        format!("sudo docker exec {} nginx -s reload", quote(&self.container))
    }
}
