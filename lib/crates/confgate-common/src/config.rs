use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Environment variable prefix for [`ToolboxConfig`].
pub const ENV_PREFIX: &str = "CONFGATE_";

/// Toolbox server configuration, loaded from `CONFGATE_*` variables via `envy`.
///
/// Only `CONFGATE_SSH_HOST` is required.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolboxConfig {
    /// MCP Streamable-HTTP listen address (default: 0.0.0.0:8080)
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Operator admin API listen address (default: 127.0.0.1:8765).
    /// ⚠️ SECURITY: must be loopback; [`ToolboxConfig::validate`] rejects
    /// anything else (CWE-1327).
    #[serde(default = "default_admin_addr")]
    pub admin_addr: SocketAddr,

    /// Remote host managed by this toolbox.
    pub ssh_host: String,

    #[serde(default = "default_ssh_user")]
    pub ssh_user: String,

    #[serde(default = "default_ssh_port")]
    pub ssh_port: u16,

    /// Private key passed to `ssh -i`. Falls back to the ssh defaults when unset.
    #[serde(default)]
    pub ssh_key_path: Option<String>,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Upper bound on any single remote call, connection setup included.
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,

    /// Remote directory for scratch files written before an atomic move.
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: String,

    #[serde(default = "default_compose_project_dir")]
    pub compose_project_dir: String,

    #[serde(default = "default_nginx_config_path")]
    pub nginx_config_path: String,

    #[serde(default = "default_nginx_container")]
    pub nginx_container: String,

    /// Comma-separated remote path prefixes that file tools may touch.
    /// Empty means unrestricted.
    #[serde(default)]
    pub allowed_path_prefixes: Vec<String>,

    /// Whether the agent-facing `apply_pending_change` tool is enabled.
    #[serde(default = "default_agent_can_apply")]
    pub agent_can_apply: bool,

    /// TLS certificate for the MCP listener (enables HTTPS with `tls_key`).
    #[serde(default)]
    pub tls_cert: Option<String>,

    #[serde(default)]
    pub tls_key: Option<String>,
}

/// Configuration errors detected after deserialization.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("CONFGATE_SSH_HOST must not be empty")]
    MissingHost,

    #[error("admin address {0} is not a loopback address")]
    AdminNotLoopback(SocketAddr),

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("scratch directory '{0}' must be an absolute path")]
    RelativeScratchDir(String),

    #[error("CONFGATE_TLS_CERT and CONFGATE_TLS_KEY must be set together")]
    IncompleteTls,
}

impl ToolboxConfig {
    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ssh_host.trim().is_empty() {
            return Err(ConfigError::MissingHost);
        }
        if !self.admin_addr.ip().is_loopback() {
            return Err(ConfigError::AdminNotLoopback(self.admin_addr));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("CONFGATE_CONNECT_TIMEOUT_SECS"));
        }
        if self.command_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("CONFGATE_COMMAND_TIMEOUT_SECS"));
        }
        if !self.scratch_dir.starts_with('/') {
            return Err(ConfigError::RelativeScratchDir(self.scratch_dir.clone()));
        }
        if self.tls_cert.is_some() != self.tls_key.is_some() {
            return Err(ConfigError::IncompleteTls);
        }
        Ok(())
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// Allowed prefixes with blanks dropped (an empty env var yields `[""]`).
    #[must_use]
    pub fn allowed_prefixes(&self) -> Vec<String> {
        self.allowed_path_prefixes
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect()
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080))
}

fn default_admin_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, 8765))
}

fn default_ssh_user() -> String {
    "svc_llm_ssh".to_string()
}

fn default_ssh_port() -> u16 {
    22
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_command_timeout_secs() -> u64 {
    60
}

fn default_scratch_dir() -> String {
    "/tmp".to_string()
}

fn default_compose_project_dir() -> String {
    "/opt/iot-stack".to_string()
}

fn default_nginx_config_path() -> String {
    "/opt/iot-stack/volumes/nginx/conf/app.conf".to_string()
}

fn default_nginx_container() -> String {
    "nginx".to_string()
}

fn default_agent_can_apply() -> bool {
    true
}

/// Default admin API base URL used by the approval CLI.
pub const DEFAULT_ADMIN_URL: &str = "http://127.0.0.1:8765";
