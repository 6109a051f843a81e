//! Structured result of a remote command and the policies that judge it.
//!
//! The executor never decides whether a command "failed"; each call site
//! picks one of the predicates below and says which one it uses.

/// Substring written to stderr by the privilege-elevation mechanism (password
/// prompts, lecture banners). Stderr containing it is not treated as an error.
pub const ELEVATION_MARKER: &str = "sudo";

/// Captured output of one remote command.
///
/// `stdout` and `stderr` are trimmed of surrounding whitespace. `exit_code` is
/// `None` when the remote process was killed by a signal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl ExecOutput {
    #[must_use]
    pub fn new(stdout: &str, stderr: &str, exit_code: Option<i32>) -> Self {
        Self {
            stdout: stdout.trim().to_string(),
            stderr: stderr.trim().to_string(),
            exit_code,
        }
    }

    /// Exit status policy: the command exited with status 0.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Stderr heuristic: non-empty stderr that does not mention
    /// [`ELEVATION_MARKER`] marks the command as failed.
    ///
    /// Deliberately permissive. Commands that return no usable exit status
    /// (or whose callers historically relied on this check) use it.
    #[must_use]
    pub fn stderr_reports_error(&self) -> bool {
        !self.stderr.is_empty() && !self.stderr.contains(ELEVATION_MARKER)
    }

    /// Exit status and stderr heuristic combined.
    #[must_use]
    pub fn clean_success(&self) -> bool {
        self.success() && !self.stderr_reports_error()
    }

    /// Phrase allow-list policy: either stream contains one of `phrases`.
    #[must_use]
    pub fn contains_any(&self, phrases: &[&str]) -> bool {
        phrases
            .iter()
            .any(|p| self.stdout.contains(p) || self.stderr.contains(p))
    }

    /// The text a caller would show: stdout, or stderr when stdout is empty.
    #[must_use]
    pub fn text(&self) -> &str {
        if self.stdout.is_empty() {
            &self.stderr
        } else {
            &self.stdout
        }
    }

    /// Human-readable dump used in failure messages.
    #[must_use]
    pub fn describe(&self) -> String {
        let status = match self.exit_code {
            Some(code) => format!("exit status {code}"),
            None => "terminated by signal".to_string(),
        };
        format!(
            "{status}\nSTDOUT:\n{}\nSTDERR:\n{}",
            self.stdout, self.stderr
        )
    }
}
