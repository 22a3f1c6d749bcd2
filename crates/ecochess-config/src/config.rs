//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Directory name under the platform config directory.
pub const APP_DIR_NAME: &str = "ecochess";

const CONFIG_FILE: &str = "config.ron";

/// Top-level client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Backend location and credentials.
    pub server: ServerConfig,
    /// Who is playing.
    pub player: PlayerConfig,
    /// Push channel and polling tuning.
    pub transport: TransportSettings,
    /// Presentation settings.
    pub display: DisplayConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the game API. The push URL is derived from it.
    pub api_base: String,
    /// Shared API key, sent as the `key` query parameter.
    pub api_key: String,
}

/// Player identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    /// Handle of the local player, with or without the leading `@`.
    pub username: String,
}

/// Transport tuning. Durations are stored as plain integers so the file
/// stays easy to edit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TransportSettings {
    /// First reconnect delay in milliseconds.
    pub backoff_floor_ms: u64,
    /// Largest reconnect delay in milliseconds.
    pub backoff_cap_ms: u64,
    /// Growth factor per failed reconnect.
    pub backoff_factor: f64,
    /// Delay at which push is abandoned for polling, in milliseconds.
    pub fallback_threshold_ms: u64,
    /// Polling period in milliseconds.
    pub poll_interval_ms: u64,
    /// Keepalive probe period on the push channel, in seconds.
    pub keepalive_secs: u64,
}

/// Presentation configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Clock redraw interval in milliseconds.
    pub clock_tick_ms: u64,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_base: "http://127.0.0.1:8000".to_string(),
            api_key: String::new(),
        }
    }
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            backoff_floor_ms: 500,
            backoff_cap_ms: 8000,
            backoff_factor: 1.6,
            fallback_threshold_ms: 4000,
            poll_interval_ms: 1200,
            keepalive_secs: 20,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { clock_tick_ms: 250 }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

// --- Duration accessors ---

impl TransportSettings {
    pub fn backoff_floor(&self) -> Duration {
        millis(self.backoff_floor_ms)
    }

    pub fn backoff_cap(&self) -> Duration {
        millis(self.backoff_cap_ms).max(self.backoff_floor())
    }

    /// Growth factor, clamped to at least 1.0 so delays never shrink.
    pub fn backoff_factor(&self) -> f64 {
        if self.backoff_factor.is_finite() && self.backoff_factor >= 1.0 {
            self.backoff_factor
        } else {
            1.0
        }
    }

    pub fn fallback_threshold(&self) -> Duration {
        millis(self.fallback_threshold_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        millis(self.poll_interval_ms)
    }

    pub fn keepalive(&self) -> Duration {
        Duration::from_secs(self.keepalive_secs.max(1))
    }
}

impl DisplayConfig {
    pub fn clock_tick(&self) -> Duration {
        millis(self.clock_tick_ms)
    }
}

// Zero periods would spin timers.
fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms.max(1))
}

/// Prefix `@` unless already present. Surrounding whitespace is dropped and
/// an empty name stays empty.
pub fn normalize_username(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('@') {
        trimmed.to_string()
    } else {
        format!("@{trimmed}")
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Default config directory: `<platform config dir>/ecochess`.
    pub fn default_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Re-read the file: returns `Some(new_config)` if it changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    /// Normalized player handle, `@`-prefixed.
    pub fn username(&self) -> String {
        normalize_username(&self.player.username)
    }

    /// Check the settings a session cannot start without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.username().is_empty() {
            return Err(ConfigError::Invalid {
                field: "player.username",
                reason: "no username configured, pass --username".to_string(),
            });
        }
        if self.server.api_base.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "server.api_base",
                reason: "empty".to_string(),
            });
        }
        Ok(())
    }
}
