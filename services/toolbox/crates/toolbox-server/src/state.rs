//! Shared application state: the change manager wired to the SSH executor,
//! plus the defaults the MCP tools fall back to.

use std::sync::Arc;

use confgate_common::ToolboxConfig;

use crate::application::services::staged_changes::ChangeManager;
use crate::infra::{SshExecutor, SshTarget, TokioCommandRunner};

/// The managed host as seen by every tool.
pub type RemoteHost = SshExecutor<TokioCommandRunner>;

/// Per-deployment defaults for tool parameters the agent may omit.
#[derive(Debug, Clone)]
pub struct ToolDefaults {
    pub compose_project_dir: String,
    pub nginx_config_path: String,
    pub nginx_container: String,
    pub allowed_prefixes: Vec<String>,
    pub agent_can_apply: bool,
}

impl ToolDefaults {
    #[must_use]
    pub fn from_config(config: &ToolboxConfig) -> Self {
        Self {
            compose_project_dir: config.compose_project_dir.clone(),
            nginx_config_path: config.nginx_config_path.clone(),
            nginx_container: config.nginx_container.clone(),
            allowed_prefixes: config.allowed_prefixes(),
            agent_can_apply: config.agent_can_apply,
        }
    }
}

pub struct AppState {
    pub changes: Arc<ChangeManager<RemoteHost>>,
    pub defaults: ToolDefaults,
}

impl AppState {
    /// Build state from validated configuration. Nothing connects yet: every
    /// remote call opens its own session.
    #[must_use]
    pub fn from_config(config: &ToolboxConfig) -> Self {
        let runner = TokioCommandRunner::new(config.command_timeout());
        let host = SshExecutor::new(
            SshTarget::from_config(config),
            runner,
            config.command_timeout(),
        );
        let changes = ChangeManager::new(Arc::new(host)).scratch_dir(&config.scratch_dir);
        Self {
            changes: Arc::new(changes),
            defaults: ToolDefaults::from_config(config),
        }
    }

    #[must_use]
    pub fn host(&self) -> &RemoteHost {
        self.changes.executor()
    }
}
