//! Configuration errors
//!
//! The roll core itself never fails; only tuning data loaded from outside
//! the crate can be rejected.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed settings JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{field} must be positive (got {value})")]
    NotPositive { field: &'static str, value: f32 },

    #[error("{field} range is inverted ({min} > {max})")]
    InvertedRange {
        field: &'static str,
        min: f32,
        max: f32,
    },

    #[error("rest frame count must be at least 1")]
    ZeroRestFrames,

    #[error("spawn radius {spawn} does not fit inside tray radius {tray}")]
    SpawnOutsideTray { spawn: f32, tray: f32 },
}
