//! Terminal client for economy chess.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p ecochess-client -- --username alice --api-key KEY`.

mod input;
mod terminal;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use ecochess_config::{CliArgs, Config};
use ecochess_net::{BackoffConfig, Endpoint, HttpGameApi, TransportConfig};
use ecochess_sync::{Session, SessionConfig};
use tokio::sync::mpsc;
use tracing::info;

use crate::terminal::TerminalPresenter;

/// Queued user commands before the reader thread blocks.
const COMMAND_QUEUE: usize = 16;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ecochess: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Resolve config directory
    let config_dir: PathBuf = match args.config.clone() {
        Some(dir) => dir,
        None => Config::default_dir()?,
    };

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    ecochess_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    config.validate()?;

    let endpoint = Endpoint::new(
        config.server.api_base.clone(),
        config.server.api_key.clone(),
        config.username(),
    );
    info!(api = %endpoint.api_base, user = %endpoint.username, "starting client");

    let api = Arc::new(HttpGameApi::new(endpoint.clone()));
    let presenter = TerminalPresenter::new(std::io::stdout(), true);
    let session =
        Session::bootstrap(api, &endpoint, presenter, session_config(&config, args.poll_only))
            .await?;
    info!(game = %session.game_id(), "joined game");

    println!("{}", input::HELP);
    let (commands_tx, commands_rx) = mpsc::channel(COMMAND_QUEUE);
    input::spawn_stdin_reader(commands_tx)?;

    session.run(commands_rx).await;
    info!("session ended");
    Ok(())
}

fn session_config(config: &Config, poll_only: bool) -> SessionConfig {
    let transport = &config.transport;
    SessionConfig {
        transport: TransportConfig {
            backoff: BackoffConfig {
                floor: transport.backoff_floor(),
                cap: transport.backoff_cap(),
                factor: transport.backoff_factor(),
                fallback_threshold: transport.fallback_threshold(),
            },
            poll_interval: transport.poll_interval(),
            keepalive_interval: transport.keepalive(),
        },
        clock_tick: config.display.clock_tick(),
        poll_only,
    }
}
