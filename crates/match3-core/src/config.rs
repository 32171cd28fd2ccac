//! Game configuration.
//!
//! Every field has a default matching the shipped tuning, so an empty JSON
//! object is a valid configuration.

use crate::board::DEFAULT_MIN_RUN_LENGTH;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading or validating a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// What happens when a committed swap forms no run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SwapPolicy {
    /// The tiles stay swapped; the board is simply re-scanned
    #[default]
    Free,
    /// The swap is undone when it forms no run
    RequireMatch,
}

/// Board dimensions and matching rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoardConfig {
    pub width: usize,
    pub height: usize,
    pub min_run_length: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: 5,
            height: 5,
            min_run_length: DEFAULT_MIN_RUN_LENGTH,
        }
    }
}

/// Seconds the presentation layer should wait after each animated phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PacingConfig {
    pub destroy: f32,
    pub fall: f32,
    pub refill: f32,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            destroy: 0.5,
            fall: 0.25,
            refill: 0.25,
        }
    }
}

/// Drag gesture thresholds, in presentation pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DragConfig {
    /// Movement needed before a drag locks onto an axis
    pub start_threshold: f32,
    /// Fraction of `tile_size` past which a swap commits
    pub complete_ratio: f32,
    pub tile_size: f32,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            start_threshold: 30.0,
            complete_ratio: 0.5,
            tile_size: 100.0,
        }
    }
}

/// Timed round settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    pub duration_secs: f32,
    /// Score needed for the round to count as won
    pub need_to_score: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_secs: 10.0,
            need_to_score: 1,
        }
    }
}

/// Complete configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    pub board: BoardConfig,
    pub pacing: PacingConfig,
    pub drag: DragConfig,
    pub session: SessionConfig,
    pub swap_policy: SwapPolicy,
    /// Seed for tile selection; `None` draws one from entropy
    pub seed: Option<u64>,
}

impl GameConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        let board = &self.board;
        if board.width == 0 || board.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "board must be at least 1x1, got {}x{}",
                board.width, board.height
            )));
        }
        if board.min_run_length < 2 {
            return Err(ConfigError::Invalid(format!(
                "min_run_length must be at least 2, got {}",
                board.min_run_length
            )));
        }

        let pacing = &self.pacing;
        if [pacing.destroy, pacing.fall, pacing.refill]
            .iter()
            .any(|d| !d.is_finite() || *d < 0.0)
        {
            return Err(ConfigError::Invalid(
                "pacing delays must be finite and non-negative".into(),
            ));
        }

        let drag = &self.drag;
        if drag.start_threshold < 0.0 || drag.tile_size <= 0.0 {
            return Err(ConfigError::Invalid(
                "drag thresholds must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&drag.complete_ratio) {
            return Err(ConfigError::Invalid(format!(
                "drag complete_ratio must be within 0..=1, got {}",
                drag.complete_ratio
            )));
        }

        if !self.session.duration_secs.is_finite() || self.session.duration_secs <= 0.0 {
            return Err(ConfigError::Invalid(
                "session duration must be positive".into(),
            ));
        }

        Ok(())
    }
}
