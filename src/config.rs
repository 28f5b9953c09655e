use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Construction-time tuning constants for the adaptation engine.
///
/// The defaults reproduce the behavior the engine was tuned with: a 30-sample
/// bandwidth window decaying at 0.75, five turn samples, a 5 second tick and a
/// 10 second turndown cooldown.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdaptationConfig {
    /// Bandwidth history depth (samples, one per tick).
    pub window: usize,
    /// Geometric decay ratio for the bandwidth weights, in (0, 1).
    pub decay_weight: f64,
    /// Turn-sample history depth.
    pub turn_capacity: usize,
    /// Estimation period.
    pub tick_period: Duration,
    /// Minimum spacing between rate-up signals after a turndown.
    pub turndown_cooldown: Duration,
}

impl Default for AdaptationConfig {
    fn default() -> Self {
        Self {
            window: 30,
            decay_weight: 0.75,
            turn_capacity: 5,
            tick_period: Duration::from_secs(5),
            turndown_cooldown: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("bandwidth window must hold at least one sample")]
    EmptyWindow,
    #[error("decay weight {0} is outside (0, 1)")]
    DecayOutOfRange(f64),
    #[error("turn history must hold at least one sample")]
    EmptyTurnHistory,
    #[error("tick period must be non-zero")]
    ZeroTickPeriod,
}

impl AdaptationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window == 0 {
            return Err(ConfigError::EmptyWindow);
        }
        if !(self.decay_weight > 0.0 && self.decay_weight < 1.0) {
            return Err(ConfigError::DecayOutOfRange(self.decay_weight));
        }
        if self.turn_capacity == 0 {
            return Err(ConfigError::EmptyTurnHistory);
        }
        if self.tick_period.is_zero() {
            return Err(ConfigError::ZeroTickPeriod);
        }
        Ok(())
    }
}
