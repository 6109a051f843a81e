//! Staged change manager: propose now, apply later.
//!
//! `propose` is local bookkeeping only. `apply` takes the change out of the
//! table before doing anything else, so an id is applied at most once whatever
//! the outcome, then runs commit → validate → activate and stops at the first
//! failed stage. A committed file is never rolled back.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use confgate_common::{ApplyResponse, ChangeId, ChangeSummary};

use crate::application::ports::{ChangeStore, RemoteExecutor};
use crate::application::services::atomic_replace::{DEFAULT_SCRATCH_DIR, replace_file};
use crate::domain::{
    ActivationParams, ApplyError, ConfigFileReplacement, PendingChange, StagedChange,
    VALIDATION_SUCCESS_PHRASES,
};

// ── In-memory store ───────────────────────────────────────────────────────────

/// Default [`ChangeStore`]: a mutex-guarded map, unbounded, no expiry.
#[derive(Debug, Default)]
pub struct MemoryChangeStore {
    entries: Mutex<HashMap<String, StagedChange>>,
}

impl MemoryChangeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ChangeStore for MemoryChangeStore {
    fn insert(&self, change: StagedChange) -> Result<(), StagedChange> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let key = change.id.as_str().to_string();
        if entries.contains_key(&key) {
            return Err(change);
        }
        entries.insert(key, change);
        Ok(())
    }

    fn take(&self, id: &str) -> Option<StagedChange> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }

    fn snapshot(&self) -> Vec<ChangeSummary> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut summaries: Vec<ChangeSummary> =
            entries.values().map(StagedChange::summary).collect();
        summaries.sort_by(|a, b| a.proposed_at.cmp(&b.proposed_at));
        summaries
    }
}

// ── Manager ───────────────────────────────────────────────────────────────────

/// Successful apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub id: ChangeId,
    pub target_path: String,
}

/// Owns the pending table and runs the per-kind apply pipelines.
pub struct ChangeManager<E, S = MemoryChangeStore> {
    executor: Arc<E>,
    store: S,
    scratch_dir: String,
}

impl<E: RemoteExecutor> ChangeManager<E> {
    /// Manager with an empty in-memory table.
    #[must_use]
    pub fn new(executor: Arc<E>) -> Self {
        Self::with_store(executor, MemoryChangeStore::new())
    }
}

impl<E: RemoteExecutor, S: ChangeStore> ChangeManager<E, S> {
    #[must_use]
    pub fn with_store(executor: Arc<E>, store: S) -> Self {
        Self {
            executor,
            store,
            scratch_dir: DEFAULT_SCRATCH_DIR.to_string(),
        }
    }

    /// Remote directory for scratch files written during commit.
    #[must_use]
    pub fn scratch_dir(mut self, dir: &str) -> Self {
        self.scratch_dir = dir.to_string();
        self
    }

    #[must_use]
    pub fn executor(&self) -> &Arc<E> {
        &self.executor
    }

    /// Stage a change and return its id. No remote interaction.
    ///
    /// Unknown kinds are accepted here and rejected by [`Self::apply`].
    pub fn propose(&self, kind: &str, target_path: &str, content: &str) -> ChangeId {
        let mut staged = StagedChange {
            id: ChangeId::generate(),
            proposed_at: Utc::now(),
            change: PendingChange::from_proposal(kind, target_path, content),
        };
        loop {
            let id = staged.id.clone();
            match self.store.insert(staged) {
                Ok(()) => {
                    tracing::info!(change_id = %id, kind, target_path, "change proposed");
                    return id;
                }
                Err(mut collided) => {
                    collided.id = ChangeId::generate();
                    staged = collided;
                }
            }
        }
    }

    /// Pending changes, oldest first. Does not consume anything.
    #[must_use]
    pub fn pending(&self) -> Vec<ChangeSummary> {
        self.store.snapshot()
    }

    /// Apply the change with `id`.
    ///
    /// The change is removed from the table first: a second call with the
    /// same id returns `ApplyError::NotFound` whatever this call's outcome.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown or consumed ids, `UnsupportedKind` for kinds
    /// without a pipeline (no remote call is made), otherwise the first failed
    /// stage: `CommitFailed`, `ValidateFailed`, or `ActivateFailed`.
    pub async fn apply(&self, id: &str, params: &ActivationParams) -> Result<Applied, ApplyError> {
        let Some(staged) = self.store.take(id) else {
            tracing::warn!(change_id = %id, "apply requested for unknown change");
            return Err(ApplyError::NotFound { id: id.to_string() });
        };

        tracing::info!(
            change_id = %staged.id,
            kind = staged.change.kind(),
            target_path = staged.change.target_path(),
            "applying pending change",
        );

        let result = match staged.change {
            PendingChange::ReplaceConfigFile(change) => {
                self.apply_config_file(change, params).await
            }
            PendingChange::Unsupported(change) => {
                Err(ApplyError::UnsupportedKind { kind: change.kind })
            }
        };

        match result {
            Ok(target_path) => {
                tracing::info!(change_id = %staged.id, %target_path, "pending change applied");
                Ok(Applied {
                    id: staged.id,
                    target_path,
                })
            }
            Err(e) => {
                tracing::warn!(change_id = %staged.id, error = %e, "pending change failed");
                Err(e)
            }
        }
    }

    /// Pipeline for [`PendingChange::ReplaceConfigFile`].
    async fn apply_config_file(
        &self,
        change: ConfigFileReplacement,
        params: &ActivationParams,
    ) -> Result<String, ApplyError> {
        let ConfigFileReplacement {
            target_path,
            content,
        } = change;

        // Commit.
        replace_file(self.executor.as_ref(), &self.scratch_dir, &target_path, &content)
            .await
            .map_err(|source| ApplyError::CommitFailed {
                target_path: target_path.clone(),
                source,
            })?;

        // Validate. `nginx -t` has no machine-readable verdict beyond its
        // exit status inside `docker exec`, and reports on stderr, so the
        // phrase allow-list is checked against both streams.
        match self.executor.run(&params.validate_command(), None).await {
            Ok(output) if output.contains_any(VALIDATION_SUCCESS_PHRASES) => {
                tracing::info!(%target_path, "validation passed");
            }
            Ok(output) => {
                return Err(ApplyError::ValidateFailed {
                    target_path,
                    detail: output.describe(),
                });
            }
            Err(e) => {
                return Err(ApplyError::ValidateFailed {
                    target_path,
                    detail: e.to_string(),
                });
            }
        }

        // Activate. Exit status only: a successful reload still writes a
        // `[notice] signal process started` line to stderr.
        match self.executor.run(&params.reload_command(), None).await {
            Ok(output) if output.success() => Ok(target_path),
            Ok(output) => Err(ApplyError::ActivateFailed {
                target_path,
                detail: output.describe(),
            }),
            Err(e) => Err(ApplyError::ActivateFailed {
                target_path,
                detail: e.to_string(),
            }),
        }
    }
}

/// Wire form of an apply outcome, shared by the MCP tool and the admin API.
#[must_use]
pub fn apply_response(id: &str, outcome: &Result<Applied, ApplyError>) -> ApplyResponse {
    match outcome {
        Ok(applied) => ApplyResponse::Applied {
            change_id: applied.id.to_string(),
            target_path: applied.target_path.clone(),
            message: format!(
                "Change {} applied: {} committed, validated, and reloaded.",
                applied.id, applied.target_path
            ),
        },
        Err(e) => ApplyResponse::Failed {
            change_id: id.to_string(),
            reason: e.failure(),
            message: e.to_string(),
        },
    }
}
