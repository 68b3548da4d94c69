#![allow(missing_docs)]

//! Application configuration.
//!
//! Values are layered: built-in defaults, then `config.toml` under the user's
//! config directory, then `TUI2048_*` environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use ::config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::{
    engine::{Rules, TWO_PROBABILITY, WIN_VALUE},
    score::{BestScorePolicy, FileScoreStore},
};

/// Directory under `~/.config` holding the configuration file.
pub const CONFIG_DIR: &str = "2048tui";
pub const CONFIG_FILE: &str = "config.toml";
pub const ENV_PREFIX: &str = "TUI2048";

const DEFAULT_CONFIG: &str = r#"# 2048tui configuration
# Every key can also be set through the environment, e.g. TUI2048_BOARD_SIZE=5.

# Edge length of the square board (2 to 16).
board_size = 4

# Tiles placed when a game starts.
start_tiles = 2

# Tile value that wins the game.
win_value = 2048

# Fixed RNG seed for reproducible games; leave unset for a random seed.
# seed = 42

# What "new game" does to the stored best score: "preserve" or "reset_on_new_game".
best_score_policy = "preserve"

# Where best scores are stored. Defaults to the platform data directory.
# data_dir = "/path/to/scores"
"#;

/// Settings for a game session and its storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub board_size: usize,
    pub start_tiles: usize,
    pub win_value: u32,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub best_score_policy: BestScorePolicy,
    pub data_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            board_size: 4,
            start_tiles: 2,
            win_value: WIN_VALUE,
            seed: None,
            best_score_policy: BestScorePolicy::Preserve,
            data_dir: FileScoreStore::default_root(),
        }
    }
}

impl AppConfig {
    /// Load from the default config file and the process environment.
    pub fn load() -> Result<Self> {
        Self::load_with(&config_path(), Environment::with_prefix(ENV_PREFIX))
    }

    /// Load from `path` (optional) layered under `environment`.
    pub fn load_with(path: &Path, environment: Environment) -> Result<Self> {
        let defaults = Self::default();
        let config = Config::builder()
            .set_default("board_size", defaults.board_size as i64)?
            .set_default("start_tiles", defaults.start_tiles as i64)?
            .set_default("win_value", i64::from(defaults.win_value))?
            .set_default("best_score_policy", "preserve")?
            .set_default("data_dir", defaults.data_dir.to_string_lossy().into_owned())?
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(environment.try_parsing(true))
            .build()
            .with_context(|| format!("failed to load configuration from {}", path.display()))?;

        let loaded: Self = config
            .try_deserialize()
            .context("failed to deserialize configuration")?;
        loaded.rules()?;
        Ok(loaded)
    }

    /// Engine rules derived from these settings.
    pub fn rules(&self) -> Result<Rules> {
        let rules = Rules {
            size: self.board_size,
            start_tiles: self.start_tiles,
            win_value: self.win_value,
            two_probability: TWO_PROBABILITY,
        };
        rules.validate().context("invalid game configuration")?;
        Ok(rules)
    }
}

/// Path of the configuration file under the user's config directory.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join(CONFIG_FILE)
}

/// Write a commented default configuration if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path();
    ensure_default_config_at(&path)?;
    Ok(path)
}

pub fn ensure_default_config_at(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write default config {}", path.display()))
}
