//! Application layer — port trait definitions and use-case orchestration.
//!
//! This module depends only on `crate::domain` — never on `crate::infra`,
//! `crate::tools`, or `crate::admin`.

pub mod ports;
pub mod services;

pub use ports::{ChangeStore, CommandRunner, RemoteExecutor};
