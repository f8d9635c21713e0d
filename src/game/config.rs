//! Game configuration.
//!
//! Every timing constant and board dimension lives here. Configs load from
//! JSON with all fields defaulted, so a file only needs the values it changes.

use std::path::Path;

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::clock::Millis;

/// Which way piece shapes project into the voxel grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimensionality {
    /// Side view: shapes stand upright in the (x, z) plane of a one-cell-deep board.
    #[default]
    Planar,
    /// Top view: shapes lie flat in the (x, y) plane at the piece height.
    Spatial,
}

/// Configuration errors. The simulation itself never fails.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid JSON for `GameConfig`.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Values parse but describe an impossible board or timing.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Simulation configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Planar or spatial board
    pub dimensionality: Dimensionality,
    /// Columns along x
    pub width: i32,
    /// Columns along y (1 for planar boards)
    pub depth: i32,
    /// Maximum column height
    pub height: i32,

    /// Fall interval of a piece before it is dropped
    pub piece_fall_slow_ms: Millis,
    /// Fall interval after a fast drop
    pub piece_fall_fast_ms: Millis,
    /// Height at which new pieces appear
    pub piece_spawn_height: i32,

    /// Cannon reload time
    pub cannon_reload_ms: Millis,
    /// Wall time per trajectory step
    pub bomb_step_ms: Millis,
    /// Cells a live bomb may drift outside the board before it is lost
    pub bomb_margin: i32,
    /// Upper bound on trajectory points per bomb
    pub trajectory_budget: u32,

    /// Lifetime of an explosion marker
    pub explosion_ttl_ms: Millis,
    /// Lifetime of a splash marker
    pub splash_ttl_ms: Millis,

    /// Build phase length
    pub build_ms: Millis,
    /// Shoot phase length
    pub shoot_ms: Millis,
    /// Length of one collapse window
    pub collapse_ms: Millis,
    /// Length of both prepare phases
    pub prepare_ms: Millis,

    /// Also run the collapse pass on every Build tick
    pub collapse_during_build: bool,

    /// Seed for piece shapes and rotations
    pub seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::planar()
    }
}

impl GameConfig {
    /// Side-view board: 50 wide, 50 tall, one cell deep.
    pub fn planar() -> Self {
        Self {
            dimensionality: Dimensionality::Planar,
            width: 50,
            depth: 1,
            height: 50,
            piece_fall_slow_ms: 1000,
            piece_fall_fast_ms: 25,
            piece_spawn_height: 44,
            cannon_reload_ms: 4000,
            bomb_step_ms: 100,
            bomb_margin: 0,
            trajectory_budget: 200,
            explosion_ttl_ms: 300,
            splash_ttl_ms: 300,
            build_ms: 10_000,
            shoot_ms: 30_000,
            collapse_ms: 200,
            prepare_ms: 5_000,
            collapse_during_build: false,
            seed: 0,
        }
    }

    /// Voxel board: 50 × 50 columns, pieces dropped from height 20.
    pub fn spatial() -> Self {
        Self {
            dimensionality: Dimensionality::Spatial,
            depth: 50,
            height: 64,
            piece_spawn_height: 20,
            bomb_margin: 4,
            ..Self::planar()
        }
    }

    /// Parse a JSON document and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Override the seed from `CASTLE_SEED` when it is set and numeric.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(seed) = std::env::var("CASTLE_SEED").ok().and_then(|v| v.parse().ok()) {
            self.seed = seed;
        }
        self
    }

    /// Reject configurations the simulation cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| -> Result<(), ConfigError> { Err(ConfigError::Invalid(msg)) };

        if self.width < 8 || self.depth < 1 || self.height < 8 {
            return invalid(format!(
                "board {}x{}x{} is too small",
                self.width, self.depth, self.height
            ));
        }
        if self.dimensionality == Dimensionality::Planar && self.depth != 1 {
            return invalid(format!("planar board must be one cell deep, got {}", self.depth));
        }
        if self.dimensionality == Dimensionality::Spatial && self.depth < 8 {
            return invalid(format!("spatial board depth {} is too small", self.depth));
        }
        if self.piece_spawn_height < 2 || self.piece_spawn_height > self.height - 3 {
            return invalid(format!(
                "spawn height {} must leave room for a piece inside height {}",
                self.piece_spawn_height, self.height
            ));
        }
        if self.bomb_step_ms == 0 {
            return invalid("bomb step time must be positive".into());
        }
        if self.trajectory_budget == 0 {
            return invalid("trajectory budget must be positive".into());
        }
        if self.bomb_margin < 0 {
            return invalid(format!("bomb margin {} is negative", self.bomb_margin));
        }
        if self.piece_fall_slow_ms == 0 || self.piece_fall_fast_ms == 0 {
            return invalid("piece fall intervals must be positive".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        assert!(GameConfig::planar().validate().is_ok());
        assert!(GameConfig::spatial().validate().is_ok());
        assert_eq!(GameConfig::default(), GameConfig::planar());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = GameConfig::from_json_str(r#"{ "seed": 7, "shoot_ms": 60000 }"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.shoot_ms, 60_000);
        assert_eq!(config.build_ms, 10_000);
        assert_eq!(config.dimensionality, Dimensionality::Planar);
    }

    #[test]
    fn test_dimensionality_names() {
        let json = serde_json::to_string(&GameConfig::spatial()).unwrap();
        assert!(json.contains("\"spatial\""));
    }

    #[test]
    fn test_rejects_deep_planar_board() {
        let config = GameConfig { depth: 4, ..GameConfig::planar() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_zero_step() {
        let config = GameConfig { bomb_step_ms: 0, ..GameConfig::spatial() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = GameConfig { trajectory_budget: 0, ..GameConfig::spatial() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            GameConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            GameConfig::load("/definitely/not/here.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
