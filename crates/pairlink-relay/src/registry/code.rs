//! Random room code candidates.

use std::ops::RangeInclusive;

use rand::RngExt;

use pairlink_core::config::CodeConfig;

use super::session::RoomCode;

/// Draws candidate codes uniformly from an inclusive numeric range.
///
/// Not cryptographically strong; codes only need to be hard to collide,
/// not hard to guess.
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    range: RangeInclusive<u32>,
    max_attempts: u32,
}

impl CodeGenerator {
    pub const fn new(range: RangeInclusive<u32>, max_attempts: u32) -> Self {
        Self {
            range,
            max_attempts,
        }
    }

    pub const fn from_config(config: &CodeConfig) -> Self {
        Self::new(config.min..=config.max, config.max_attempts)
    }

    /// Collisions tolerated before allocation fails.
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn candidate(&self) -> RoomCode {
        let mut rng = rand::rng();
        RoomCode::from(rng.random_range(self.range.clone()))
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::from_config(&CodeConfig::default())
    }
}
