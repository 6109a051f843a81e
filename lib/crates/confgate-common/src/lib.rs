pub mod config;
pub mod ids;
pub mod types;

pub use config::{ConfigError, DEFAULT_ADMIN_URL, ENV_PREFIX, ToolboxConfig};
pub use ids::{ChangeId, approval, random_hex, validate_change_id};
pub use types::*;
