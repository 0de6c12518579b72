//! Rigid-body world for the dice tray
//!
//! `PhysicsWorld` is the seam between the scene driver and a physics engine.
//! `TrayWorld` implements it over rapier: convex-hull dice on a cuboid floor,
//! fenced in by a ring of wall colliders.

use std::collections::BTreeMap;
use std::fmt;

use glam::{Quat, Vec3};
use rapier3d::na::{Quaternion, UnitQuaternion};
use rapier3d::prelude::{
    CCDSolver, ColliderBuilder, ColliderSet, DefaultBroadPhase, ImpulseJointSet,
    IntegrationParameters, IslandManager, Isometry, MultibodyJointSet, NarrowPhase,
    PhysicsPipeline, Point, Real, RigidBodyBuilder, RigidBodyHandle, RigidBodySet, Vector,
};
use serde::{Deserialize, Serialize};

use super::settle::MotionSample;

/// Handle to a body owned by a physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(pub u32);

/// What to build when inserting a body
#[derive(Debug, Clone)]
pub struct BodyDesc {
    pub mass: f32,
    /// Convex hull vertices in the body frame
    pub hull: Vec<Vec3>,
}

/// Pose and velocities of one body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub position: Vec3,
    pub orientation: Quat,
    pub linvel: Vec3,
    pub angvel: Vec3,
}

impl BodyState {
    pub fn motion_sample(&self) -> MotionSample {
        MotionSample {
            linvel: self.linvel,
            angvel: self.angvel,
            orientation: self.orientation,
        }
    }

    /// Hull vertex in world space
    pub fn world_point(&self, local: Vec3) -> Vec3 {
        self.position + self.orientation * local
    }
}

/// A throw: new pose, velocities, then one extra push
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Throw {
    pub position: Vec3,
    pub orientation: Quat,
    pub linvel: Vec3,
    pub angvel: Vec3,
    pub impulse: Vec3,
    pub torque_impulse: Vec3,
}

/// Interface the scene driver needs from a physics engine.
///
/// Lookups by a stale or unknown handle are no-ops.
pub trait PhysicsWorld {
    fn insert(&mut self, desc: BodyDesc) -> BodyHandle;
    fn remove(&mut self, handle: BodyHandle) -> bool;
    /// Remove every body
    fn clear(&mut self);
    fn body(&self, handle: BodyHandle) -> Option<BodyState>;
    /// Apply a throw. Returns false if the body is missing.
    fn launch(&mut self, handle: BodyHandle, throw: &Throw) -> bool;
    fn step(&mut self, dt: f32);
}

/// Material and tray parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsParams {
    /// Vertical acceleration (negative is down)
    pub gravity: f32,
    pub restitution: f32,
    pub friction: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    /// Height of the tray floor
    pub floor_y: f32,
    /// Inner radius of the circular tray wall
    pub tray_radius: f32,
    pub wall_height: f32,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            gravity: -9.81,
            restitution: 0.35,
            friction: 0.8,
            linear_damping: 0.25,
            angular_damping: 0.35,
            floor_y: 0.0,
            tray_radius: 6.5,
            wall_height: 8.0,
        }
    }
}

/// Segments approximating the round wall
const WALL_SEGMENTS: usize = 32;
const WALL_HALF_THICKNESS: f32 = 0.25;
const FLOOR_HALF_THICKNESS: f32 = 0.2;

fn to_vector(v: Vec3) -> Vector<Real> {
    Vector::new(v.x, v.y, v.z)
}

fn from_vector(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

fn to_rotation(q: Quat) -> UnitQuaternion<Real> {
    UnitQuaternion::new_normalize(Quaternion::new(q.w, q.x, q.y, q.z))
}

fn from_rotation(r: &UnitQuaternion<Real>) -> Quat {
    let c = r.quaternion().coords;
    Quat::from_xyzw(c.x, c.y, c.z, c.w).normalize()
}

/// Rapier dice tray
pub struct TrayWorld {
    params: PhysicsParams,
    integration: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
    /// Stable iteration order by our own handle
    handles: BTreeMap<BodyHandle, RigidBodyHandle>,
    next_handle: u32,
}

impl fmt::Debug for TrayWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrayWorld")
            .field("params", &self.params)
            .field("bodies", &self.handles.len())
            .finish()
    }
}

impl TrayWorld {
    pub fn new(params: PhysicsParams) -> Self {
        let mut world = Self {
            params,
            integration: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            handles: BTreeMap::new(),
            next_handle: 1,
        };
        world.build_tray();
        world
    }

    /// Static floor and wall ring
    fn build_tray(&mut self) {
        let p = self.params;
        let extent = p.tray_radius + 2.0 * WALL_HALF_THICKNESS + 1.0;

        let floor = ColliderBuilder::cuboid(extent, FLOOR_HALF_THICKNESS, extent)
            .translation(Vector::new(0.0, p.floor_y - FLOOR_HALF_THICKNESS, 0.0))
            .restitution(p.restitution)
            .friction(p.friction)
            .build();
        self.colliders.insert(floor);

        let half_height = p.wall_height * 0.5;
        let center_radius = p.tray_radius + WALL_HALF_THICKNESS;
        // Long enough that neighbouring segments overlap at the corners
        let half_len = (p.tray_radius + 2.0 * WALL_HALF_THICKNESS)
            * (std::f32::consts::PI / WALL_SEGMENTS as f32).tan()
            + WALL_HALF_THICKNESS;

        for i in 0..WALL_SEGMENTS {
            let theta = i as f32 * std::f32::consts::TAU / WALL_SEGMENTS as f32;
            // Local +X points along the radius
            let pose = Isometry::new(
                Vector::new(
                    center_radius * theta.cos(),
                    p.floor_y + half_height,
                    center_radius * theta.sin(),
                ),
                Vector::new(0.0, -theta, 0.0),
            );
            let wall = ColliderBuilder::cuboid(WALL_HALF_THICKNESS, half_height, half_len)
                .position(pose)
                .restitution(p.restitution)
                .friction(p.friction)
                .build();
            self.colliders.insert(wall);
        }
    }

    pub fn params(&self) -> &PhysicsParams {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl Default for TrayWorld {
    fn default() -> Self {
        Self::new(PhysicsParams::default())
    }
}

impl PhysicsWorld for TrayWorld {
    fn insert(&mut self, desc: BodyDesc) -> BodyHandle {
        let body = RigidBodyBuilder::dynamic()
            .linear_damping(self.params.linear_damping)
            .angular_damping(self.params.angular_damping)
            .ccd_enabled(true)
            .build();
        let rb_handle = self.bodies.insert(body);

        let points: Vec<Point<Real>> = desc
            .hull
            .iter()
            .map(|v| Point::new(v.x, v.y, v.z))
            .collect();
        let shape = ColliderBuilder::convex_hull(&points).unwrap_or_else(|| {
            let radius = desc.hull.iter().map(|v| v.length()).fold(0.5_f32, f32::max);
            log::warn!("Degenerate die hull, falling back to a ball of radius {}", radius);
            ColliderBuilder::ball(radius)
        });
        let collider = shape
            .mass(desc.mass.max(1e-3))
            .restitution(self.params.restitution)
            .friction(self.params.friction)
            .build();
        self.colliders
            .insert_with_parent(collider, rb_handle, &mut self.bodies);

        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;
        self.handles.insert(handle, rb_handle);
        handle
    }

    fn remove(&mut self, handle: BodyHandle) -> bool {
        let Some(rb_handle) = self.handles.remove(&handle) else {
            return false;
        };
        self.bodies
            .remove(
                rb_handle,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some()
    }

    fn clear(&mut self) {
        let handles: Vec<BodyHandle> = self.handles.keys().copied().collect();
        for handle in handles {
            self.remove(handle);
        }
    }

    fn body(&self, handle: BodyHandle) -> Option<BodyState> {
        let rb = self.bodies.get(*self.handles.get(&handle)?)?;
        Some(BodyState {
            position: from_vector(rb.translation()),
            orientation: from_rotation(rb.rotation()),
            linvel: from_vector(rb.linvel()),
            angvel: from_vector(rb.angvel()),
        })
    }

    fn launch(&mut self, handle: BodyHandle, throw: &Throw) -> bool {
        let Some(rb) = self
            .handles
            .get(&handle)
            .and_then(|h| self.bodies.get_mut(*h))
        else {
            return false;
        };
        rb.set_translation(to_vector(throw.position), true);
        rb.set_rotation(to_rotation(throw.orientation), true);
        rb.set_linvel(to_vector(throw.linvel), true);
        rb.set_angvel(to_vector(throw.angvel), true);
        rb.apply_impulse(to_vector(throw.impulse), true);
        rb.apply_torque_impulse(to_vector(throw.torque_impulse), true);
        true
    }

    fn step(&mut self, dt: f32) {
        if dt.is_nan() || dt <= 0.0 {
            return;
        }
        self.integration.dt = dt;
        let gravity = Vector::new(0.0, self.params.gravity, 0.0);
        self.pipeline.step(
            &gravity,
            &self.integration,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            None,
            &(),
            &(),
        );
    }
}
