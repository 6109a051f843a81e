//! confgate toolbox: MCP tools for inspecting a remote host, and staged,
//! human-approved replacement of its configuration files.
//!
//! Layering follows ports and adapters: `domain` is pure, `application`
//! declares ports and orchestrates use cases, `infra` talks to the outside
//! world, and `tools` / `admin` are the two inbound surfaces.

pub mod admin;
pub mod application;
pub mod domain;
pub mod infra;
pub mod shutdown;
pub mod state;
pub mod tools;
