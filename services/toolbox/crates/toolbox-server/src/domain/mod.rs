//! Domain layer — change model, command output policy, and input validation.
//!
//! This module has zero imports from `crate::infra`, `crate::application`,
//! `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod change;
pub mod error;
pub mod exec;
pub mod shell;
pub mod validate;

pub use change::{
    ActivationParams, ConfigFileReplacement, PendingChange, StagedChange, UnsupportedChange,
    VALIDATION_SUCCESS_PHRASES,
};
pub use error::{ApplyError, InputError, RemoteError, ReplaceError};
pub use exec::{ELEVATION_MARKER, ExecOutput};
pub use validate::{ComposeAction, validate_name, validate_remote_path};
