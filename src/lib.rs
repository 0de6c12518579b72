//! D10 Tray - dice-pool roller core for a d10 tabletop RPG companion
//!
//! Core modules:
//! - `pool`: Pool arithmetic and authoritative die generation
//! - `tier`: Face classification and roll tallies
//! - `stats`: Stat catalog and the read-only character snapshot
//! - `sim`: Deterministic 3D dice tray (physics, settling, scene driver)
//! - `spinner`: 2D "spinning digits" presentation
//! - `timers`: Cooperative deferred-callback scheduler
//! - `session`: The current roll, owned and replaced on every roll
//! - `settings`: Data-driven tuning, persisted to LocalStorage on web

pub mod error;
pub mod pool;
pub mod session;
pub mod settings;
pub mod sim;
pub mod spinner;
pub mod stats;
pub mod tier;
pub mod timers;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use error::ConfigError;
pub use pool::{DiceRoller, Die, DieId, DieKind, PoolSize, RollResult, compute_pool};
pub use session::RollSession;
pub use settings::TraySettings;
pub use stats::{RollConfiguration, StatKey, StatSnapshot};
pub use tier::{RollTally, Tier, tally, tier};

use rand::Rng;

/// Engine configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz for stable contacts)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame delta accepted before clamping (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Faces on every die in the pool
    pub const FACE_COUNT: u8 = 10;
    /// Lowest distress level a character can have
    pub const MIN_DISTRESS: u8 = 1;
    /// Highest distress level a character can have
    pub const MAX_DISTRESS: u8 = 5;
    /// Highest value a single stat can hold
    pub const MAX_STAT: u8 = 5;
}

/// Draw one uniformly distributed d10 face
#[inline]
pub fn roll_d10<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    rng.random_range(1..=consts::FACE_COUNT)
}

/// Uniform sample in `[min, max]`, tolerating a collapsed range
#[inline]
pub fn rand_range<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    if max <= min {
        return min;
    }
    rng.random_range(min..max)
}
