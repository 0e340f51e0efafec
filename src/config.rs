//! Game configuration: field size, speed curve, scoring. Fixed for the length of a game.

use thiserror::Error;

/// Full field size including the one-cell wall (matches the classic 25×8 board).
pub const DEFAULT_FIELD_WIDTH: usize = 25;
pub const DEFAULT_FIELD_HEIGHT: usize = 8;
/// Ticks per scroll step at the start of a game.
pub const DEFAULT_TICK_THRESHOLD: u32 = 40;
pub const DEFAULT_REWARD: u32 = 25;
/// Every time the score crosses a multiple of this, the game speeds up.
pub const DEFAULT_SPEEDUP_EVERY: u32 = 100;
pub const DEFAULT_SPEEDUP_STEP: u32 = 2;
/// Fastest allowed scroll cadence.
pub const DEFAULT_MIN_TICK_THRESHOLD: u32 = 5;

/// Largest field that still fits a terminal once each cell is drawn two columns wide.
pub const MAX_FIELD_WIDTH: usize = 500;
pub const MAX_FIELD_HEIGHT: usize = 500;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("field must be at least 3x3 including the wall, got {width}x{height}")]
    FieldTooSmall { width: usize, height: usize },
    #[error("field must be at most {}x{}, got {width}x{height}", MAX_FIELD_WIDTH, MAX_FIELD_HEIGHT)]
    FieldTooLarge { width: usize, height: usize },
    #[error("tick threshold must be positive")]
    ZeroTickThreshold,
    #[error("minimum tick threshold must be positive")]
    ZeroMinThreshold,
    #[error("minimum tick threshold {min} is above the starting threshold {initial}")]
    MinAboveInitial { min: u32, initial: u32 },
    #[error("speedup interval must be positive")]
    ZeroSpeedupInterval,
    #[error("spawn chance must be in (0, 1], got {0}")]
    SpawnChance(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    /// Field width in cells, wall included.
    pub width: usize,
    /// Field height in cells, wall included.
    pub height: usize,
    pub tick_threshold: u32,
    pub reward: u32,
    pub speedup_every: u32,
    pub speedup_step: u32,
    pub min_tick_threshold: u32,
    /// Probability that a scroll step spawns a token. 1.0 spawns on every step.
    pub spawn_chance: f64,
    pub seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_FIELD_WIDTH,
            height: DEFAULT_FIELD_HEIGHT,
            tick_threshold: DEFAULT_TICK_THRESHOLD,
            reward: DEFAULT_REWARD,
            speedup_every: DEFAULT_SPEEDUP_EVERY,
            speedup_step: DEFAULT_SPEEDUP_STEP,
            min_tick_threshold: DEFAULT_MIN_TICK_THRESHOLD,
            spawn_chance: 1.0,
            seed: 0,
        }
    }
}

impl GameConfig {
    /// Reject settings the game loop cannot run with. Called once at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width <= 2 || self.height <= 2 {
            return Err(ConfigError::FieldTooSmall {
                width: self.width,
                height: self.height,
            });
        }
        if self.width > MAX_FIELD_WIDTH || self.height > MAX_FIELD_HEIGHT {
            return Err(ConfigError::FieldTooLarge {
                width: self.width,
                height: self.height,
            });
        }
        if self.tick_threshold == 0 {
            return Err(ConfigError::ZeroTickThreshold);
        }
        if self.min_tick_threshold == 0 {
            return Err(ConfigError::ZeroMinThreshold);
        }
        if self.min_tick_threshold > self.tick_threshold {
            return Err(ConfigError::MinAboveInitial {
                min: self.min_tick_threshold,
                initial: self.tick_threshold,
            });
        }
        if self.speedup_every == 0 {
            return Err(ConfigError::ZeroSpeedupInterval);
        }
        // NaN fails both comparisons, so it is rejected here too.
        if !(self.spawn_chance > 0.0 && self.spawn_chance <= 1.0) {
            return Err(ConfigError::SpawnChance(self.spawn_chance));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(GameConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_rejects_tiny_field() {
        let config = GameConfig {
            width: 2,
            ..GameConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::FieldTooSmall {
                width: 2,
                height: DEFAULT_FIELD_HEIGHT
            })
        );
    }

    #[test]
    fn test_rejects_huge_field() {
        for (width, height) in [(40_000, 8), (25, MAX_FIELD_HEIGHT + 1), (usize::MAX, usize::MAX)] {
            let config = GameConfig {
                width,
                height,
                ..GameConfig::default()
            };
            assert_eq!(
                config.validate(),
                Err(ConfigError::FieldTooLarge { width, height })
            );
        }
        let largest = GameConfig {
            width: MAX_FIELD_WIDTH,
            height: MAX_FIELD_HEIGHT,
            ..GameConfig::default()
        };
        assert_eq!(largest.validate(), Ok(()));
    }

    #[test]
    fn test_rejects_zero_threshold() {
        let config = GameConfig {
            tick_threshold: 0,
            ..GameConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroTickThreshold));
    }

    #[test]
    fn test_rejects_floor_above_start() {
        let config = GameConfig {
            tick_threshold: 4,
            min_tick_threshold: 5,
            ..GameConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::MinAboveInitial { min: 5, initial: 4 })
        );
    }

    #[test]
    fn test_rejects_bad_spawn_chance() {
        for chance in [0.0, -0.5, 1.5, f64::NAN] {
            let config = GameConfig {
                spawn_chance: chance,
                ..GameConfig::default()
            };
            assert!(config.validate().is_err(), "chance {} accepted", chance);
        }
    }
}
