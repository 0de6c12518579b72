//! Deterministic 3D dice tray
//!
//! Everything physical lives here. This module must stay deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by body handle)
//! - No rendering or platform dependencies

pub mod d10;
pub mod scene;
pub mod settle;
pub mod world;

pub use d10::{D10_FACE_COUNT, D10_VERTEX_COUNT, D10Geometry};
pub use scene::{
    DieBodyParams, DieView, FrameTicket, LaunchParams, Range3, SceneDriver, SettleEvent,
    SettledMap, launch_body, sample_throw,
};
pub use settle::{
    MotionSample, SettlePhase, SettleStep, SettleThresholds, advance, is_quiescent, up_face,
};
pub use world::{
    BodyDesc, BodyHandle, BodyState, PhysicsParams, PhysicsWorld, Throw, TrayWorld,
};
