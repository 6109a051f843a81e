//! MCP tool implementations for the confgate toolbox.
//!
//! Inspection tools run one-shot commands on the managed host. The single
//! mutating tool, `propose_nginx_config_update`, only stages a change: nothing
//! touches the host until `apply_pending_change` (or the operator's
//! `confgate-approve apply`) is invoked with the returned id.

use std::sync::Arc;

use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::ServerInfo,
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use confgate_common::{ChangeKind, ChangeSummary, approval};

use crate::application::services::inspect::{self, DEFAULT_LOG_LINES};
use crate::application::services::staged_changes::apply_response;
use crate::domain::{ActivationParams, ComposeAction, validate_name, validate_remote_path};
use crate::state::AppState;

// ===================================================================
// Input structs
// ===================================================================

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ContainerLogsInput {
    /// Docker container name.
    pub container_name: String,
    /// Number of trailing lines (default 100).
    #[serde(default)]
    pub lines: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ComposeLogsInput {
    /// Service name from docker-compose.yml.
    pub service_name: String,
    /// Number of trailing lines (default 100).
    #[serde(default)]
    pub lines: Option<u32>,
    /// Compose project directory; the configured default when omitted.
    #[serde(default)]
    pub compose_project_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ComposeProjectInput {
    /// Compose project directory; the configured default when omitted.
    #[serde(default)]
    pub compose_project_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ComposeActionInput {
    /// One of `up`, `down`, `restart`, `pull`.
    pub action: String,
    #[serde(default)]
    pub compose_project_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CrontabInput {
    /// Remote user whose crontab is listed.
    pub username: String,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct NginxConfigInput {
    /// Absolute path of the nginx config; the configured default when omitted.
    #[serde(default)]
    pub config_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ProposeNginxInput {
    /// Full replacement content of the config file.
    pub proposed_content: String,
    #[serde(default)]
    pub config_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ApplyChangeInput {
    /// Id returned by `propose_nginx_config_update`.
    pub change_id: String,
    /// Container running nginx; the configured default when omitted.
    #[serde(default)]
    pub nginx_container_name: Option<String>,
}

// ===================================================================
// Output structs
// ===================================================================

/// Output returned by `propose_nginx_config_update`.
#[derive(Debug, Clone, Serialize)]
pub struct ProposeOutput {
    pub message: String,
    pub change_id: String,
    pub target_path: String,
    /// What the user types in chat to apply the change.
    pub chat_command: String,
    /// Operator command that applies the change out of band.
    pub apply_command: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PendingChangesOutput {
    pub pending: Vec<ChangeSummary>,
}

// ===================================================================
// ConfgateTools — the MCP server handler
// ===================================================================

#[derive(Clone)]
pub struct ConfgateTools {
    state: Arc<AppState>,
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for ConfgateTools {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfgateTools")
            .field("state", &"<AppState>")
            .finish()
    }
}

impl ConfgateTools {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            state,
            tool_router: Self::tool_router(),
        }
    }

    fn project_dir(&self, requested: Option<String>) -> String {
        requested.unwrap_or_else(|| self.state.defaults.compose_project_dir.clone())
    }

    fn nginx_path(&self, requested: Option<String>) -> String {
        requested.unwrap_or_else(|| self.state.defaults.nginx_config_path.clone())
    }
}

// -------------------------------------------------------------------
// Tool implementations
// -------------------------------------------------------------------

#[tool_router]
impl ConfgateTools {
    #[tool(description = "Read the last N lines of logs from a Docker container.")]
    async fn read_docker_container_logs(
        &self,
        params: Parameters<ContainerLogsInput>,
    ) -> Result<String, String> {
        let input = params.0;
        let lines = input.lines.unwrap_or(DEFAULT_LOG_LINES);
        inspect::container_logs(self.state.host(), &input.container_name, lines)
            .await
            .map_err(|e| format!("Failed to read logs for '{}': {e:#}", input.container_name))
    }

    #[tool(description = "Read the last N lines of logs for a docker-compose service.")]
    async fn read_docker_compose_logs(
        &self,
        params: Parameters<ComposeLogsInput>,
    ) -> Result<String, String> {
        let input = params.0;
        let dir = self.project_dir(input.compose_project_dir);
        let lines = input.lines.unwrap_or(DEFAULT_LOG_LINES);
        let prefixes = &self.state.defaults.allowed_prefixes;
        inspect::compose_logs(self.state.host(), &dir, prefixes, &input.service_name, lines)
            .await
            .map_err(|e| format!("Failed to read logs for service '{}': {e:#}", input.service_name))
    }

    #[tool(description = "List the containers of a docker-compose project and their state.")]
    async fn list_docker_compose_containers(
        &self,
        params: Parameters<ComposeProjectInput>,
    ) -> Result<String, String> {
        let dir = self.project_dir(params.0.compose_project_dir);
        inspect::compose_ps(self.state.host(), &dir, &self.state.defaults.allowed_prefixes)
            .await
            .map_err(|e| format!("Failed to list containers in {dir}: {e:#}"))
    }

    #[tool(description = "Run a docker-compose action (up, down, restart, pull) \
        in a compose project directory.")]
    async fn docker_compose_action(
        &self,
        params: Parameters<ComposeActionInput>,
    ) -> Result<String, String> {
        let input = params.0;
        let action = ComposeAction::parse(&input.action).map_err(|e| e.to_string())?;
        let dir = self.project_dir(input.compose_project_dir);
        let prefixes = &self.state.defaults.allowed_prefixes;
        let output = inspect::compose_action(self.state.host(), &dir, prefixes, action)
            .await
            .map_err(|e| format!("docker-compose {action} failed in {dir}: {e:#}"))?;
        Ok(format!("docker-compose {action} completed in {dir}.\n{output}"))
    }

    #[tool(description = "Read the docker-compose.yml of a compose project.")]
    async fn read_docker_compose_file(
        &self,
        params: Parameters<ComposeProjectInput>,
    ) -> Result<String, String> {
        let dir = self.project_dir(params.0.compose_project_dir);
        inspect::read_compose_file(self.state.host(), &dir, &self.state.defaults.allowed_prefixes)
            .await
            .map_err(|e| format!("Failed to read compose file in {dir}: {e:#}"))
    }

    #[tool(description = "List the crontab of a remote user.")]
    async fn read_crontab(&self, params: Parameters<CrontabInput>) -> Result<String, String> {
        let input = params.0;
        inspect::read_crontab(self.state.host(), &input.username)
            .await
            .map_err(|e| format!("Failed to read crontab for '{}': {e:#}", input.username))
    }

    #[tool(description = "Read the current nginx configuration file.")]
    async fn read_nginx_config(
        &self,
        params: Parameters<NginxConfigInput>,
    ) -> Result<String, String> {
        let path = self.nginx_path(params.0.config_path);
        inspect::read_config_file(self.state.host(), &path, &self.state.defaults.allowed_prefixes)
            .await
            .map_err(|e| format!("Failed to read {path}: {e:#}"))
    }

    /// Stage a full replacement of the nginx config. No remote call is made.
    #[tool(description = "Propose a full replacement of the nginx configuration. \
        The change is only staged; it returns a change_id that must be \
        applied separately after human review.")]
    async fn propose_nginx_config_update(
        &self,
        params: Parameters<ProposeNginxInput>,
    ) -> Result<String, String> {
        let input = params.0;
        let path = self.nginx_path(input.config_path);
        validate_remote_path(&path, &self.state.defaults.allowed_prefixes)
            .map_err(|e| e.to_string())?;

        let id = self.state.changes.propose(
            ChangeKind::ReplaceConfigFile.as_str(),
            &path,
            &input.proposed_content,
        );

        let output = ProposeOutput {
            message: format!(
                "Proposed update to {path} staged as {id}. Nothing has been changed yet; \
                 review the content, then apply it with the command below."
            ),
            change_id: id.to_string(),
            target_path: path,
            chat_command: approval::chat_command(id.as_str()),
            apply_command: approval::cli_command(id.as_str()),
        };
        to_json(&output)
    }

    #[tool(description = "Apply a previously proposed change: write the file \
        atomically, validate it with `nginx -t`, then reload nginx.")]
    async fn apply_pending_change(
        &self,
        params: Parameters<ApplyChangeInput>,
    ) -> Result<String, String> {
        let input = params.0;
        if !self.state.defaults.agent_can_apply {
            return Err(format!(
                "Applying changes from the agent is disabled. Ask the operator to run: {}",
                approval::cli_command(&input.change_id)
            ));
        }

        let container = input
            .nginx_container_name
            .unwrap_or_else(|| self.state.defaults.nginx_container.clone());
        validate_name("nginx_container_name", &container).map_err(|e| e.to_string())?;

        let activation = ActivationParams::for_container(&container);
        let outcome = self.state.changes.apply(&input.change_id, &activation).await;
        let response = apply_response(&input.change_id, &outcome);
        let body = to_json(&response)?;
        if response.is_applied() {
            Ok(body)
        } else {
            Err(body)
        }
    }

    #[tool(description = "List staged changes awaiting apply (content is not included).")]
    async fn list_pending_changes(&self) -> Result<String, String> {
        to_json(&PendingChangesOutput {
            pending: self.state.changes.pending(),
        })
    }
}

// -------------------------------------------------------------------
// ServerHandler implementation (via tool_handler macro)
// -------------------------------------------------------------------

#[tool_handler]
impl ServerHandler for ConfgateTools {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "confgate toolbox: inspect containers, compose projects, crontabs \
                 and nginx config on the managed host. Config changes are staged \
                 with propose_nginx_config_update and applied separately."
                    .into(),
            ),
            ..Default::default()
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization error: {e}"))
}
