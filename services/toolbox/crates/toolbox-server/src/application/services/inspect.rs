//! Read-mostly inspection of the remote host: container logs, compose state,
//! crontabs, and configuration files.
//!
//! These are one-shot commands. Output is judged with the stderr heuristic,
//! and every caller-supplied name or path is validated and quoted first.

use anyhow::Result;

use crate::application::ports::RemoteExecutor;
use crate::domain::shell::quote;
use crate::domain::{ComposeAction, ExecOutput, RemoteError, validate_name, validate_remote_path};

/// Default number of log lines returned by the log tools.
pub const DEFAULT_LOG_LINES: u32 = 100;

/// Compose file name inside a compose project directory.
pub const COMPOSE_FILE_NAME: &str = "docker-compose.yml";

/// Run `command` and apply the stderr heuristic.
///
/// Returns stdout, or stderr when stdout is empty (e.g. a `sudo` banner).
///
/// # Errors
///
/// `RemoteError::Execution` carrying both streams when stderr reports an
/// error; transport errors are passed through.
pub async fn run_checked(
    exec: &impl RemoteExecutor,
    command: &str,
    working_dir: Option<&str>,
) -> Result<String, RemoteError> {
    let output: ExecOutput = exec.run(command, working_dir).await?;
    if output.stderr_reports_error() {
        return Err(RemoteError::Execution(format!(
            "'{command}' failed\n{}",
            output.describe()
        )));
    }
    Ok(output.text().to_string())
}

/// `docker logs <container> --tail <lines>`.
///
/// # Errors
///
/// Returns an error if the name is invalid or the command fails.
pub async fn container_logs(
    exec: &impl RemoteExecutor,
    container: &str,
    lines: u32,
) -> Result<String> {
    validate_name("container_name", container)?;
    let command = format!("docker logs {} --tail {lines}", quote(container));
    Ok(run_checked(exec, &command, None).await?)
}

/// `docker-compose logs --tail=<lines> <service>` in the project directory.
///
/// # Errors
///
/// Returns an error if an input is invalid or the command fails.
pub async fn compose_logs(
    exec: &impl RemoteExecutor,
    project_dir: &str,
    allowed_prefixes: &[String],
    service: &str,
    lines: u32,
) -> Result<String> {
    validate_remote_path(project_dir, allowed_prefixes)?;
    validate_name("service_name", service)?;
    let command = format!("docker-compose logs --tail={lines} {}", quote(service));
    Ok(run_checked(exec, &command, Some(project_dir)).await?)
}

/// `docker-compose ps` in the project directory.
///
/// # Errors
///
/// Returns an error if the directory is invalid or the command fails.
pub async fn compose_ps(
    exec: &impl RemoteExecutor,
    project_dir: &str,
    allowed_prefixes: &[String],
) -> Result<String> {
    validate_remote_path(project_dir, allowed_prefixes)?;
    Ok(run_checked(exec, "docker-compose ps", Some(project_dir)).await?)
}

/// `docker-compose <action>` in the project directory.
///
/// # Errors
///
/// Returns an error if the directory is invalid or the command fails.
pub async fn compose_action(
    exec: &impl RemoteExecutor,
    project_dir: &str,
    allowed_prefixes: &[String],
    action: ComposeAction,
) -> Result<String> {
    validate_remote_path(project_dir, allowed_prefixes)?;
    let command = format!("docker-compose {}", action.args());
    tracing::info!(%project_dir, %action, "running compose action");
    Ok(run_checked(exec, &command, Some(project_dir)).await?)
}

/// Contents of `<project_dir>/docker-compose.yml`.
///
/// # Errors
///
/// Returns an error if the path is rejected or the read fails.
pub async fn read_compose_file(
    exec: &impl RemoteExecutor,
    project_dir: &str,
    allowed_prefixes: &[String],
) -> Result<String> {
    let path = format!("{}/{COMPOSE_FILE_NAME}", project_dir.trim_end_matches('/'));
    read_config_file(exec, &path, allowed_prefixes).await
}

/// `sudo crontab -u <user> -l`.
///
/// # Errors
///
/// Returns an error if the user name is invalid or the command fails.
pub async fn read_crontab(exec: &impl RemoteExecutor, username: &str) -> Result<String> {
    validate_name("username", username)?;
    let command = format!("sudo crontab -u {} -l", quote(username));
    Ok(run_checked(exec, &command, None).await?)
}

/// Contents of a remote configuration file.
///
/// # Errors
///
/// Returns an error if the path is rejected or the read fails.
pub async fn read_config_file(
    exec: &impl RemoteExecutor,
    path: &str,
    allowed_prefixes: &[String],
) -> Result<String> {
    validate_remote_path(path, allowed_prefixes)?;
    Ok(exec.read_file(path).await?)
}
