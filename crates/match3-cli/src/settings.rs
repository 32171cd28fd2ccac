//! Runtime settings read from the environment.

use match3_core::{ConfigError, GameConfig};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Config(#[from] ConfigError),

    #[error("MATCH3_SEED must be an unsigned integer, got {0:?}")]
    BadSeed(String),

    #[error("MATCH3_TIME_SCALE must be a positive number, got {0:?}")]
    BadTimeScale(String),
}

/// Everything the autoplayer needs to run a round
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: GameConfig,
    /// Pacing speed multiplier; 2.0 replays phases twice as fast
    pub time_scale: f32,
    /// Print events as JSON lines instead of logging them
    pub json: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config: GameConfig::default(),
            time_scale: 1.0,
            json: false,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(path) = lookup("MATCH3_CONFIG") {
            let path = PathBuf::from(path);
            let json = std::fs::read_to_string(&path)
                .map_err(|source| SettingsError::Read { path, source })?;
            settings.config = GameConfig::from_json_str(&json)?;
        }

        if let Some(seed) = lookup("MATCH3_SEED") {
            let parsed = seed
                .trim()
                .parse::<u64>()
                .map_err(|_| SettingsError::BadSeed(seed.clone()))?;
            settings.config.seed = Some(parsed);
        }

        if let Some(scale) = lookup("MATCH3_TIME_SCALE") {
            settings.time_scale = scale
                .trim()
                .parse::<f32>()
                .ok()
                .filter(|s| s.is_finite() && *s > 0.0)
                .ok_or_else(|| SettingsError::BadTimeScale(scale.clone()))?;
        }

        settings.json = lookup("MATCH3_JSON").is_some_and(|v| v == "1" || v == "true");

        Ok(settings)
    }
}
