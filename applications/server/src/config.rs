/// Server configuration
use crate::error::{Result, ServerError};
use lyre_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file read when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "lyre.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_server")]
    pub server: ServerSettings,

    #[serde(default = "default_storage")]
    pub storage: StorageSettings,

    #[serde(default)]
    pub remote: RemoteSettings,

    #[serde(default = "default_playback")]
    pub playback: PlaybackSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    /// 0 binds an ephemeral port
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    /// Key/value snapshot file
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    /// Directory holding `songs.json` and `menus.json`
    #[serde(default = "default_library_dir")]
    pub library_dir: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RemoteSettings {
    /// Static files of the phone control page, served at `/`
    #[serde(default)]
    pub public_dir: Option<PathBuf>,

    /// Cover art served at `/covers`
    #[serde(default)]
    pub covers_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackSettings {
    /// Tick of the headless clock backend
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,

    /// Minimum spacing of progress-driven snapshot writes
    #[serde(default = "default_persist_interval_ms")]
    pub persist_interval_ms: u64,

    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

impl PlaybackSettings {
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    /// Engine configuration derived from these settings
    pub fn engine_config(&self) -> PlaybackConfig {
        PlaybackConfig {
            history_capacity: self.history_capacity,
            persist_interval: Duration::from_millis(self.persist_interval_ms),
        }
    }
}

impl ServerConfig {
    /// Load configuration from file and environment
    ///
    /// `path` overrides the default `lyre.toml`; a missing default file is
    /// fine, a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let config_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if config_path.exists() {
                    settings = settings.add_source(config::File::from(config_path));
                }
            }
        }

        // Override with environment variables (prefixed with LYRE_)
        settings = settings.add_source(
            config::Environment::with_prefix("LYRE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.playback.persist_interval_ms == 0 {
            return Err(ServerError::Config(
                "playback.persist_interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.playback.progress_interval_ms == 0 {
            return Err(ServerError::Config(
                "playback.progress_interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.playback.history_capacity == 0 {
            return Err(ServerError::Config(
                "playback.history_capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

// Default values
fn default_server() -> ServerSettings {
    ServerSettings {
        host: default_host(),
        port: default_port(),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5201
}

fn default_storage() -> StorageSettings {
    StorageSettings {
        state_file: default_state_file(),
        library_dir: default_library_dir(),
    }
}

fn default_state_file() -> PathBuf {
    PathBuf::from("./data/state.json")
}

fn default_library_dir() -> PathBuf {
    PathBuf::from("./data/library")
}

fn default_playback() -> PlaybackSettings {
    PlaybackSettings {
        progress_interval_ms: default_progress_interval_ms(),
        persist_interval_ms: default_persist_interval_ms(),
        history_capacity: default_history_capacity(),
    }
}

fn default_progress_interval_ms() -> u64 {
    250
}

fn default_persist_interval_ms() -> u64 {
    1000
}

fn default_history_capacity() -> usize {
    lyre_playback::types::DEFAULT_HISTORY_CAPACITY
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            storage: default_storage(),
            remote: RemoteSettings::default(),
            playback: default_playback(),
        }
    }
}
