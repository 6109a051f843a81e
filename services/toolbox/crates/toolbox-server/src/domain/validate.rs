//! Validation of caller-supplied names and paths (CWE-20, CWE-22).
//!
//! Pure functions only — no I/O.

use std::fmt;

use crate::domain::error::InputError;

const MAX_NAME_LEN: usize = 128;

/// Validates a container, service, or user name.
///
/// Accepts `^[A-Za-z0-9][A-Za-z0-9_.-]{0,127}$`, the docker container name
/// alphabet, which also covers POSIX user names.
pub fn validate_name(field: &'static str, value: &str) -> Result<(), InputError> {
    let mut chars = value.chars();
    let valid_first = chars.next().is_some_and(|c| c.is_ascii_alphanumeric());
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || "_.-".contains(c));
    if !valid_first || !valid_rest || value.len() > MAX_NAME_LEN {
        return Err(InputError::InvalidName {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Validates a remote path before it is read, written, or used as a
/// working directory.
///
/// The path must be absolute, contain no NUL byte and no `..` component, and,
/// when `allowed_prefixes` is non-empty, lie under one of them. Prefix
/// matching respects component boundaries: `/etc/nginx` admits
/// `/etc/nginx/app.conf` but not `/etc/nginx-evil/app.conf`.
pub fn validate_remote_path(path: &str, allowed_prefixes: &[String]) -> Result<(), InputError> {
    let reject = |reason| InputError::InvalidPath {
        path: path.to_string(),
        reason,
    };
    if path.contains('\0') {
        return Err(reject("contains a NUL byte"));
    }
    if !path.starts_with('/') {
        return Err(reject("must be absolute"));
    }
    if path.split('/').any(|component| component == "..") {
        return Err(reject("must not contain '..'"));
    }
    if !allowed_prefixes.is_empty()
        && !allowed_prefixes
            .iter()
            .any(|prefix| is_under(path, prefix))
    {
        return Err(reject("outside the allowed path prefixes"));
    }
    Ok(())
}

fn is_under(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return true;
    }
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// `docker-compose` lifecycle actions an agent may trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeAction {
    Up,
    Down,
    Restart,
    Pull,
}

impl ComposeAction {
    /// Parse a lowercase action name.
    pub fn parse(raw: &str) -> Result<Self, InputError> {
        match raw.trim().to_lowercase().as_str() {
            "up" => Ok(ComposeAction::Up),
            "down" => Ok(ComposeAction::Down),
            "restart" => Ok(ComposeAction::Restart),
            "pull" => Ok(ComposeAction::Pull),
            _ => Err(InputError::InvalidComposeAction(raw.to_string())),
        }
    }

    /// Arguments passed to `docker-compose`. `up` is detached so the call
    /// returns once the containers are started.
    #[must_use]
    pub fn args(self) -> &'static str {
        match self {
            ComposeAction::Up => "up -d",
            ComposeAction::Down => "down",
            ComposeAction::Restart => "restart",
            ComposeAction::Pull => "pull",
        }
    }
}

impl fmt::Display for ComposeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComposeAction::Up => "up",
            ComposeAction::Down => "down",
            ComposeAction::Restart => "restart",
            ComposeAction::Pull => "pull",
        };
        f.write_str(name)
    }
}
