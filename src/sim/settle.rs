//! Settling detection
//!
//! Polled once per simulation step for every body that has not settled yet.
//! Works on plain motion samples, so it can be driven by any physics engine
//! or by synthetic sequences in tests.
//!
//! A body enters `Settling` as soon as its launch impulse is applied and
//! becomes `Settled` after a run of consecutive quiescent frames. `Settled`
//! is terminal until the body is relaunched.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Quiescence thresholds, tuned empirically
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettleThresholds {
    /// Max sum of absolute linear velocity components
    pub linear_speed: f32,
    /// Max sum of absolute angular velocity components
    pub angular_speed: f32,
    /// Consecutive quiescent frames required to settle
    pub rest_frames: u32,
    /// Force a reading after this many seconds of motion (None = wait forever)
    pub timeout_secs: Option<f32>,
}

impl Default for SettleThresholds {
    fn default() -> Self {
        Self {
            linear_speed: 0.07,
            angular_speed: 0.12,
            rest_frames: 25,
            timeout_secs: Some(8.0),
        }
    }
}

/// Physical state of one body at the end of a step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSample {
    pub linvel: Vec3,
    pub angvel: Vec3,
    pub orientation: Quat,
}

impl MotionSample {
    /// Sum of absolute linear velocity components
    pub fn linear_speed(&self) -> f32 {
        self.linvel.abs().element_sum()
    }

    /// Sum of absolute angular velocity components
    pub fn angular_speed(&self) -> f32 {
        self.angvel.abs().element_sum()
    }
}

/// Whether a body counts as still for this frame
pub fn is_quiescent(sample: &MotionSample, thresholds: &SettleThresholds) -> bool {
    sample.linear_speed() < thresholds.linear_speed
        && sample.angular_speed() < thresholds.angular_speed
}

/// Detector state for one body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SettlePhase {
    /// Moving since launch
    Settling {
        still_frames: u32,
        /// Simulated seconds since launch
        elapsed: f32,
    },
    /// At rest with the observed top face
    Settled { observed: u8 },
}

impl Default for SettlePhase {
    fn default() -> Self {
        Self::launched()
    }
}

impl SettlePhase {
    /// State right after the launch impulse
    pub fn launched() -> Self {
        SettlePhase::Settling {
            still_frames: 0,
            elapsed: 0.0,
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, SettlePhase::Settled { .. })
    }

    pub fn observed(&self) -> Option<u8> {
        match self {
            SettlePhase::Settled { observed } => Some(*observed),
            SettlePhase::Settling { .. } => None,
        }
    }
}

/// Result of feeding one sample to the detector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettleStep {
    pub phase: SettlePhase,
    /// Set only on the step that entered `Settled`
    pub settled: Option<u8>,
}

/// Advance the detector by one simulation step.
///
/// Once settled, further calls return the same phase and never re-emit.
pub fn advance(
    phase: SettlePhase,
    sample: &MotionSample,
    dt: f32,
    thresholds: &SettleThresholds,
    faces: &[(Vec3, u8)],
) -> SettleStep {
    let (still_frames, elapsed) = match phase {
        SettlePhase::Settled { .. } => {
            return SettleStep {
                phase,
                settled: None,
            };
        }
        SettlePhase::Settling {
            still_frames,
            elapsed,
        } => (still_frames, elapsed + dt),
    };

    let still_frames = if is_quiescent(sample, thresholds) {
        still_frames + 1
    } else {
        0
    };

    let timed_out = thresholds.timeout_secs.is_some_and(|t| elapsed >= t);

    if still_frames >= thresholds.rest_frames || timed_out {
        let observed = up_face(sample.orientation, faces);
        return SettleStep {
            phase: SettlePhase::Settled { observed },
            settled: Some(observed),
        };
    }

    SettleStep {
        phase: SettlePhase::Settling {
            still_frames,
            elapsed,
        },
        settled: None,
    }
}

/// Value of the face whose rotated normal points most nearly up.
///
/// Ties keep the first face in table order.
pub fn up_face(orientation: Quat, faces: &[(Vec3, u8)]) -> u8 {
    let mut best_match = faces.first().map(|(_, v)| *v).unwrap_or(1);
    let mut best_dot = f32::NEG_INFINITY;

    for (normal, value) in faces {
        let dot = (orientation * *normal).dot(Vec3::Y);
        if dot > best_dot {
            best_dot = dot;
            best_match = *value;
        }
    }

    best_match
}
