//! Infrastructure layer — concrete implementations of application port traits.
//!
//! Process execution and the SSH transport live here. Imports from
//! `crate::domain` and `crate::application::ports` are allowed; imports from
//! `crate::tools` or `crate::admin` are forbidden.

pub mod command_runner;
pub mod ssh;

pub use command_runner::{CommandTimeout, TokioCommandRunner};
pub use ssh::{SshExecutor, SshTarget};
