//! Atomic replacement of a remote file.
//!
//! Content goes to a uniquely named scratch file first; a single elevated
//! `mv` then puts it over the target. The rename is the only externally
//! visible transition, so readers of the target see the old file or the new
//! one in full, never a partial write.

use confgate_common::random_hex;

use crate::application::ports::RemoteExecutor;
use crate::domain::ReplaceError;
use crate::domain::shell::quote;

/// Default scratch directory on the remote host.
pub const DEFAULT_SCRATCH_DIR: &str = "/tmp";

/// Successful replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replaced {
    pub target_path: String,
}

/// Scratch path for `target`: `<scratch_dir>/<basename>.tmp_<16 hex>`.
#[must_use]
pub fn temp_path_for(scratch_dir: &str, target: &str) -> String {
    let basename = target
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or("file");
    format!(
        "{}/{basename}.tmp_{}",
        scratch_dir.trim_end_matches('/'),
        random_hex()
    )
}

/// Replace `target` with `content` on the remote host.
///
/// # Errors
///
/// `ReplaceError::Write` if the scratch file could not be written;
/// `ReplaceError::Move` if the rename failed. Both attempt to remove the
/// scratch file first; that cleanup is best-effort and only logged.
pub async fn replace_file(
    exec: &impl RemoteExecutor,
    scratch_dir: &str,
    target: &str,
    content: &str,
) -> Result<Replaced, ReplaceError> {
    let temp_path = temp_path_for(scratch_dir, target);

    if let Err(source) = exec.write_file(&temp_path, content).await {
        // A partial write may still have created the file.
        discard_temp(exec, &temp_path).await;
        return Err(ReplaceError::Write { temp_path, source });
    }

    // Exit status plus the stderr heuristic: `sudo` prompts on stderr are
    // tolerated, anything else written there fails the move.
    let move_command = format!("sudo mv -- {} {}", quote(&temp_path), quote(target));
    let failure = match exec.run(&move_command, None).await {
        Ok(output) if output.clean_success() => None,
        Ok(output) => Some(output.describe()),
        Err(e) => Some(e.to_string()),
    };

    if let Some(detail) = failure {
        discard_temp(exec, &temp_path).await;
        return Err(ReplaceError::Move {
            temp_path,
            target_path: target.to_string(),
            detail,
        });
    }

    tracing::info!(target_path = %target, bytes = content.len(), "remote file replaced");
    Ok(Replaced {
        target_path: target.to_string(),
    })
}

async fn discard_temp(exec: &impl RemoteExecutor, temp_path: &str) {
    let command = format!("rm -f -- {}", quote(temp_path));
    match exec.run(&command, None).await {
        Ok(output) if output.success() => {
            tracing::debug!(temp_path, "removed temporary file");
        }
        Ok(output) => {
            tracing::warn!(temp_path, detail = %output.describe(), "failed to remove temporary file");
        }
        Err(e) => {
            tracing::warn!(temp_path, error = %e, "failed to remove temporary file");
        }
    }
}
