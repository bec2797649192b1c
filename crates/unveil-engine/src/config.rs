//! Engine configuration: cadence presets and options.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tick cadence preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RevealSpeed {
    /// Relaxed reading pace.
    Slow,
    #[default]
    Normal,
    /// Near-instant reveal for skimming.
    Fast,
}

impl RevealSpeed {
    /// Milliseconds between reveal ticks for this preset.
    pub fn tick_interval(self) -> Duration {
        match self {
            RevealSpeed::Slow => Duration::from_millis(120),
            RevealSpeed::Normal => Duration::from_millis(50),
            RevealSpeed::Fast => Duration::from_millis(15),
        }
    }
}

/// Options for constructing a reveal engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Tick cadence preset.
    pub speed: RevealSpeed,
    /// Fixed RNG seed for deterministic chunk sizes. Unset draws from
    /// entropy.
    pub seed: Option<u64>,
}
