//! POSIX shell quoting for values interpolated into remote command lines.

use std::borrow::Cow;

use shell_escape::unix::escape;

/// Quote `value` for a POSIX shell. Plain paths like `/etc/nginx/app.conf`
/// are returned unchanged; anything with metacharacters is single-quoted.
#[must_use]
pub fn quote(value: &str) -> String {
    escape(Cow::Borrowed(value)).into_owned()
}

/// Prefix `command` with a change of directory, as `cd <dir> && <command>`.
///
/// A failing `cd` surfaces as a failure of the combined command.
#[must_use]
pub fn in_directory(working_dir: Option<&str>, command: &str) -> String {
    match working_dir {
        Some(dir) => format!("cd {} && {command}", quote(dir)),
        None => command.to_string(),
    }
}
