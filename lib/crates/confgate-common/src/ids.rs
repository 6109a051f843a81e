use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix of every pending-change identifier.
pub const CHANGE_ID_PREFIX: &str = "chg-";

/// Number of lowercase hex characters following [`CHANGE_ID_PREFIX`].
pub const CHANGE_ID_RANDOM_LEN: usize = 16;

/// Approval command constants shown to agents and operators.
pub mod approval {
    /// Phrase an agent relays to the human to trigger the apply tool.
    pub const CHAT_PREFIX: &str = "Apply change";

    /// Binary name of the operator approval CLI.
    pub const CLI_NAME: &str = "confgate-approve";

    /// Chat phrase for applying a change, e.g. `Apply change chg-0123456789abcdef`.
    pub fn chat_command(change_id: &str) -> String {
        format!("{CHAT_PREFIX} {change_id}")
    }

    /// Operator CLI invocation for applying a change.
    pub fn cli_command(change_id: &str) -> String {
        format!("{CLI_NAME} apply {change_id}")
    }
}

/// Opaque handle to a staged change.
///
/// Format: `chg-` followed by 16 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeId(String);

impl ChangeId {
    /// Generate a fresh identifier.
    ///
    /// Uniqueness within a table is enforced by the store, which rejects
    /// duplicates so the caller can draw again.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("{CHANGE_ID_PREFIX}{}", random_hex()))
    }

    /// Parse and validate an identifier supplied by an untrusted caller.
    pub fn parse(raw: &str) -> Result<Self, &'static str> {
        validate_change_id(raw)?;
        Ok(Self(raw.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ChangeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validate that a change id matches `chg-[a-f0-9]{16}`.
/// SECURITY: call before forwarding ids from untrusted input (CWE-20).
pub fn validate_change_id(change_id: &str) -> Result<(), &'static str> {
    if change_id.len() != CHANGE_ID_PREFIX.len() + CHANGE_ID_RANDOM_LEN {
        return Err("change_id must be exactly 20 characters");
    }
    let Some(suffix) = change_id.strip_prefix(CHANGE_ID_PREFIX) else {
        return Err("change_id must start with 'chg-'");
    };
    if !suffix
        .chars()
        .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
    {
        return Err("change_id suffix must be lowercase hex [a-f0-9]");
    }
    Ok(())
}

/// 16 lowercase hex characters from the low half of a v4 UUID, which
/// skips the version nibble. Used for change ids and scratch file suffixes.
#[must_use]
pub fn random_hex() -> String {
    let (_, low) = Uuid::new_v4().as_u64_pair();
    format!("{low:016x}")
}
