//! Command-line argument parsing for the economy chess client.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Economy chess client command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "ecochess", about = "Terminal client for economy chess")]
pub struct CliArgs {
    /// Base URL of the game API (e.g. http://127.0.0.1:8000).
    #[arg(long)]
    pub api_base: Option<String>,

    /// API key sent with every request.
    #[arg(long)]
    pub api_key: Option<String>,

    /// Player handle, with or without the leading `@`.
    #[arg(long)]
    pub username: Option<String>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Never open the push channel; poll from the start.
    #[arg(long)]
    pub poll_only: bool,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    ///
    /// `--poll-only` is not a persisted setting and is read from the
    /// arguments directly.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref base) = args.api_base {
            self.server.api_base = base.clone();
        }
        if let Some(ref key) = args.api_key {
            self.server.api_key = key.clone();
        }
        if let Some(ref name) = args.username {
            self.player.username = name.clone();
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
