//! Configuration for the economy chess client.
//!
//! Settings persist to disk as RON and can be overridden from the command
//! line. Every section uses `#[serde(default)]` so older and newer files
//! both load.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    APP_DIR_NAME, Config, DebugConfig, DisplayConfig, PlayerConfig, ServerConfig, TransportSettings,
    normalize_username,
};
pub use error::ConfigError;
