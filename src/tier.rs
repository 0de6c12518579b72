//! Face classification and roll tallies

use serde::{Deserialize, Serialize};

/// Outcome tier of a single face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    CriticalFailure,
    Failure,
    Success,
    CriticalSuccess,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::CriticalFailure => "critical-failure",
            Tier::Failure => "failure",
            Tier::Success => "success",
            Tier::CriticalSuccess => "critical-success",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Tier::Success | Tier::CriticalSuccess)
    }

    /// Emissive glow color (linear RGB) used to tint dice in the 3D tray
    pub fn glow_rgb(&self) -> [f32; 3] {
        match self {
            Tier::CriticalFailure => [1.0, 0.231, 0.188],
            Tier::Failure => [1.0, 0.420, 0.388],
            Tier::Success => [0.435, 0.886, 0.604],
            Tier::CriticalSuccess => [0.204, 0.780, 0.349],
        }
    }
}

/// Classify a face value. Values outside 1..=10 saturate to the nearest end.
pub fn tier(value: u8) -> Tier {
    match value {
        0..=1 => Tier::CriticalFailure,
        2..=5 => Tier::Failure,
        6..=9 => Tier::Success,
        _ => Tier::CriticalSuccess,
    }
}

/// Summary counts over a non-empty set of faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RollTally {
    /// Faces of 6 or more
    pub successes: u32,
    /// Faces showing 10
    pub criticals: u32,
    /// Faces showing 1
    pub ones: u32,
    pub sum: u32,
}

/// Tally a sequence of faces. An empty sequence has nothing to report.
pub fn tally<I>(values: I) -> Option<RollTally>
where
    I: IntoIterator<Item = u8>,
{
    let mut out = RollTally::default();
    let mut any = false;

    for value in values {
        any = true;
        match tier(value) {
            Tier::CriticalFailure => out.ones += 1,
            Tier::Failure => {}
            Tier::Success => out.successes += 1,
            Tier::CriticalSuccess => {
                out.successes += 1;
                out.criticals += 1;
            }
        }
        out.sum += u32::from(value);
    }

    any.then_some(out)
}
