//! 3D dice tray scene driver
//!
//! Owns one rigid body per die of the presented roll, launches them with
//! randomized impulses, advances the world on a fixed timestep and polls the
//! settling detector. The face read off a settled body is cosmetic: the
//! roll's outcome is always the authoritative die value.

use std::collections::BTreeMap;

use glam::{EulerRot, Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::d10::D10Geometry;
use super::settle::{SettlePhase, SettleThresholds, advance};
use super::world::{BodyDesc, BodyHandle, PhysicsWorld, Throw, TrayWorld};
use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::pool::{Die, DieId, DieKind, RollResult};
use crate::rand_range;
use crate::tier::{RollTally, Tier, tier};

/// Axis-aligned sampling box for launch vectors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range3 {
    pub min: Vec3,
    pub max: Vec3,
}

impl Range3 {
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Sample uniformly, widening the box around its center by `spread`
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, spread: f32) -> Vec3 {
        let center = (self.min + self.max) * 0.5;
        let half = (self.max - self.min) * 0.5 * spread;
        let lo = center - half;
        let hi = center + half;
        Vec3::new(
            rand_range(rng, lo.x, hi.x),
            rand_range(rng, lo.y, hi.y),
            rand_range(rng, lo.z, hi.z),
        )
    }
}

/// Launch randomization
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchParams {
    /// Dice spawn within this horizontal disk
    pub spawn_radius: f32,
    pub spawn_height_min: f32,
    pub spawn_height_max: f32,
    pub linvel: Range3,
    pub angvel: Range3,
    /// Extra push applied after the velocities are set
    pub impulse: Range3,
    pub torque_impulse: Range3,
    /// Range multiplier for distress dice (more chaotic tumbling)
    pub distress_spread: f32,
    /// Delay between consecutive dice launches
    pub stagger_secs: f32,
}

impl Default for LaunchParams {
    fn default() -> Self {
        Self {
            spawn_radius: 2.2,
            spawn_height_min: 3.2,
            spawn_height_max: 4.4,
            linvel: Range3::new(Vec3::new(-1.2, 0.2, -1.2), Vec3::new(1.2, 1.2, 1.2)),
            angvel: Range3::new(Vec3::new(-8.0, -10.0, -8.0), Vec3::new(8.0, 10.0, 8.0)),
            impulse: Range3::new(Vec3::new(-1.8, 0.8, -1.8), Vec3::new(1.8, 2.2, 1.8)),
            torque_impulse: Range3::new(
                Vec3::new(-8.0, -12.0, -8.0),
                Vec3::new(8.0, 12.0, 8.0),
            ),
            distress_spread: 1.35,
            stagger_secs: 0.05,
        }
    }
}

/// Die body shape and mass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DieBodyParams {
    /// Equator radius of the bipyramid
    pub radius: f32,
    /// Apex height
    pub apex: f32,
    pub mass_normal: f32,
    pub mass_distress: f32,
}

impl Default for DieBodyParams {
    fn default() -> Self {
        Self {
            radius: 1.0,
            apex: 1.2,
            mass_normal: 0.95,
            mass_distress: 1.05,
        }
    }
}

impl DieBodyParams {
    pub fn mass(&self, kind: DieKind) -> f32 {
        match kind {
            DieKind::Normal => self.mass_normal,
            DieKind::Distress => self.mass_distress,
        }
    }
}

/// Draw a throw for one die.
///
/// Distress dice sample from ranges widened by `distress_spread`.
pub fn sample_throw<R: Rng + ?Sized>(kind: DieKind, params: &LaunchParams, rng: &mut R) -> Throw {
    let spread = match kind {
        DieKind::Normal => 1.0,
        DieKind::Distress => params.distress_spread,
    };

    // sqrt keeps the spawn points uniform over the disk
    let r = params.spawn_radius * rng.random::<f32>().sqrt();
    let theta = rng.random_range(0.0..std::f32::consts::TAU);
    let y = rand_range(rng, params.spawn_height_min, params.spawn_height_max);

    let pi = std::f32::consts::PI;
    let orientation = Quat::from_euler(
        EulerRot::XYZ,
        rand_range(rng, 0.0, pi),
        rand_range(rng, 0.0, pi),
        rand_range(rng, 0.0, pi),
    );

    Throw {
        position: Vec3::new(r * theta.cos(), y, r * theta.sin()),
        orientation,
        linvel: params.linvel.sample(rng, spread),
        angvel: params.angvel.sample(rng, spread),
        impulse: params.impulse.sample(rng, spread),
        torque_impulse: params.torque_impulse.sample(rng, spread),
    }
}

/// Reset a body above the tray and throw it.
///
/// Returns false if the body is not in the world.
pub fn launch_body<W, R>(
    world: &mut W,
    handle: BodyHandle,
    kind: DieKind,
    params: &LaunchParams,
    rng: &mut R,
) -> bool
where
    W: PhysicsWorld + ?Sized,
    R: Rng + ?Sized,
{
    let throw = sample_throw(kind, params, rng);
    world.launch(handle, &throw)
}

/// Identifies the roll a frame callback was requested for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameTicket {
    generation: u64,
}

impl FrameTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Emitted once per die per roll when its body comes to rest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettleEvent {
    pub generation: u64,
    pub die: DieId,
    pub kind: DieKind,
    /// Face read off the body
    pub observed: u8,
    /// Face the roll actually produced
    pub authoritative: u8,
}

/// Observed settled face per die, filled as bodies come to rest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettledMap(BTreeMap<DieId, u8>);

impl SettledMap {
    /// Record a reading. A die can only be recorded once.
    pub fn record(&mut self, id: DieId, observed: u8) -> bool {
        if self.0.contains_key(&id) {
            return false;
        }
        self.0.insert(id, observed);
        true
    }

    pub fn get(&self, id: DieId) -> Option<u8> {
        self.0.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (DieId, u8)> + '_ {
        self.0.iter().map(|(id, v)| (*id, *v))
    }
}

/// Render/UI view of one die
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DieView {
    pub id: DieId,
    pub kind: DieKind,
    pub authoritative_value: u8,
    pub observed_value: Option<u8>,
    /// Glow tint, from the authoritative value
    pub glow: Tier,
    pub position: Option<Vec3>,
    pub orientation: Option<Quat>,
}

impl DieView {
    /// The settled body shows a different face than the roll produced
    pub fn mismatch(&self) -> bool {
        self.observed_value
            .is_some_and(|observed| observed != self.authoritative_value)
    }
}

#[derive(Debug, Clone)]
struct DieSlot {
    die: Die,
    /// None until launched
    handle: Option<BodyHandle>,
    phase: SettlePhase,
    launch_at: f32,
    /// The world dropped the body after launch
    lost: bool,
}

impl DieSlot {
    /// Nothing left to simulate for this die
    fn finished(&self) -> bool {
        self.phase.is_settled() || self.lost
    }
}

/// Drives the physics tray for the current roll
#[derive(Debug)]
pub struct SceneDriver<W: PhysicsWorld = TrayWorld> {
    world: W,
    geometry: D10Geometry,
    body_params: DieBodyParams,
    thresholds: SettleThresholds,
    launch: LaunchParams,
    rng: Pcg32,
    roll: RollResult,
    slots: Vec<DieSlot>,
    settled: SettledMap,
    generation: u64,
    /// Simulated seconds since the current launch
    clock: f32,
    accumulator: f32,
    active: bool,
}

impl<W: PhysicsWorld> SceneDriver<W> {
    pub fn new(
        world: W,
        body_params: DieBodyParams,
        thresholds: SettleThresholds,
        launch: LaunchParams,
        seed: u64,
    ) -> Self {
        Self {
            world,
            geometry: D10Geometry::new(body_params.radius, body_params.apex),
            body_params,
            thresholds,
            launch,
            rng: Pcg32::seed_from_u64(seed),
            roll: RollResult::empty(),
            slots: Vec::new(),
            settled: SettledMap::default(),
            generation: 0,
            clock: 0.0,
            accumulator: 0.0,
            active: false,
        }
    }

    /// Show a roll. An identical roll keeps the running simulation.
    pub fn present(&mut self, roll: &RollResult) -> FrameTicket {
        if self.generation > 0 && self.roll == *roll {
            return self.ticket();
        }
        self.roll = roll.clone();
        self.rebuild()
    }

    /// Throw the current dice again
    pub fn reroll(&mut self) -> FrameTicket {
        self.rebuild()
    }

    /// Stop simulating. Safe to call any number of times.
    pub fn cancel(&mut self) {
        if self.active {
            log::info!("Scene cancelled (generation {})", self.generation);
        }
        self.active = false;
        self.accumulator = 0.0;
    }

    fn rebuild(&mut self) -> FrameTicket {
        self.generation += 1;
        self.world.clear();
        self.settled.clear();
        self.clock = 0.0;
        self.accumulator = 0.0;

        let stagger = self.launch.stagger_secs.max(0.0);
        self.slots = self
            .roll
            .dice()
            .iter()
            .enumerate()
            .map(|(i, die)| DieSlot {
                die: *die,
                handle: None,
                phase: SettlePhase::launched(),
                launch_at: i as f32 * stagger,
                lost: false,
            })
            .collect();
        self.active = !self.slots.is_empty();

        log::info!(
            "Scene launched {} dice (generation {})",
            self.slots.len(),
            self.generation
        );
        self.ticket()
    }

    /// Ticket for frames belonging to the current roll
    pub fn ticket(&self) -> FrameTicket {
        FrameTicket {
            generation: self.generation,
        }
    }

    /// Per-frame callback. Frames for a superseded roll are discarded.
    pub fn frame(&mut self, ticket: FrameTicket, frame_dt: f32) -> Vec<SettleEvent> {
        if ticket.generation != self.generation {
            log::trace!(
                "Discarding stale frame (generation {} != {})",
                ticket.generation,
                self.generation
            );
            return Vec::new();
        }
        if !self.active {
            return Vec::new();
        }

        // max() discards NaN, which clamp() would pass through
        self.accumulator += frame_dt.max(0.0).min(MAX_FRAME_DT);

        let mut events = Vec::new();
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS && self.active {
            events.extend(self.step(SIM_DT));
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        events
    }

    /// Advance the simulation one step and poll every unsettled body
    pub fn step(&mut self, dt: f32) -> Vec<SettleEvent> {
        if !self.active {
            return Vec::new();
        }
        self.clock += dt;

        let Self {
            world,
            geometry,
            body_params,
            thresholds,
            launch,
            rng,
            slots,
            settled,
            generation,
            clock,
            ..
        } = self;

        for slot in slots.iter_mut() {
            if slot.handle.is_some() || *clock < slot.launch_at {
                continue;
            }
            let handle = world.insert(BodyDesc {
                mass: body_params.mass(slot.die.kind()),
                hull: geometry.vertices.to_vec(),
            });
            launch_body(world, handle, slot.die.kind(), launch, rng);
            slot.handle = Some(handle);
            slot.phase = SettlePhase::launched();
        }

        world.step(dt);

        let mut events = Vec::new();
        for slot in slots.iter_mut() {
            if slot.finished() {
                continue;
            }
            let Some(handle) = slot.handle else {
                continue;
            };
            let Some(body) = world.body(handle) else {
                log::warn!("{} lost its body, skipping it", slot.die.id());
                slot.lost = true;
                continue;
            };

            let step = advance(
                slot.phase,
                &body.motion_sample(),
                dt,
                thresholds,
                &geometry.faces,
            );
            slot.phase = step.phase;

            if let Some(observed) = step.settled {
                if settled.record(slot.die.id(), observed) {
                    log::debug!(
                        "{} settled showing {} (rolled {})",
                        slot.die.id(),
                        observed,
                        slot.die.value()
                    );
                    events.push(SettleEvent {
                        generation: *generation,
                        die: slot.die.id(),
                        kind: slot.die.kind(),
                        observed,
                        authoritative: slot.die.value(),
                    });
                }
            }
        }

        if self.slots.iter().all(DieSlot::finished) {
            self.active = false;
            log::info!(
                "All {} dice settled (generation {})",
                self.settled.len(),
                self.generation
            );
        }

        events
    }

    /// Relaunch a single die of the current roll. No-op for an unknown die
    /// or one whose body is missing.
    pub fn launch(&mut self, id: DieId) -> bool {
        let Some(slot) = self.slots.iter_mut().find(|s| s.die.id() == id) else {
            return false;
        };
        let Some(handle) = slot.handle.filter(|_| !slot.lost) else {
            return false;
        };
        if !launch_body(
            &mut self.world,
            handle,
            slot.die.kind(),
            &self.launch,
            &mut self.rng,
        ) {
            return false;
        }
        if slot.phase.is_settled() {
            // The reading stands for this roll; only the body moves again
            return true;
        }
        slot.phase = SettlePhase::launched();
        self.active = true;
        true
    }

    pub fn all_settled(&self) -> bool {
        self.slots.iter().all(|s| s.phase.is_settled())
    }

    /// Still simulating (host should keep requesting frames)
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn roll(&self) -> &RollResult {
        &self.roll
    }

    pub fn settled(&self) -> &SettledMap {
        &self.settled
    }

    pub fn geometry(&self) -> &D10Geometry {
        &self.geometry
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    /// Authoritative tallies, reported only once every die has settled
    pub fn tally(&self) -> Option<RollTally> {
        if !self.all_settled() {
            return None;
        }
        self.roll.tally()
    }

    pub fn views(&self) -> Vec<DieView> {
        self.slots
            .iter()
            .map(|slot| {
                let body = slot.handle.and_then(|h| self.world.body(h));
                DieView {
                    id: slot.die.id(),
                    kind: slot.die.kind(),
                    authoritative_value: slot.die.value(),
                    observed_value: self.settled.get(slot.die.id()),
                    glow: tier(slot.die.value()),
                    position: body.map(|b| b.position),
                    orientation: body.map(|b| b.orientation),
                }
            })
            .collect()
    }
}

impl SceneDriver<TrayWorld> {
    /// Scene on the built-in tray engine
    pub fn with_tray(
        physics: super::world::PhysicsParams,
        body_params: DieBodyParams,
        thresholds: SettleThresholds,
        launch: LaunchParams,
        seed: u64,
    ) -> Self {
        Self::new(TrayWorld::new(physics), body_params, thresholds, launch, seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DiceRoller;
    use crate::sim::world::BodyState;
    use std::collections::HashSet;

    /// World where every body stops dead on each step
    #[derive(Default)]
    struct StillWorld {
        bodies: Vec<(BodyHandle, BodyState, f32)>,
        next: u32,
    }

    impl PhysicsWorld for StillWorld {
        fn insert(&mut self, desc: BodyDesc) -> BodyHandle {
            self.next += 1;
            let h = BodyHandle(self.next);
            let state = BodyState {
                position: Vec3::ZERO,
                orientation: Quat::IDENTITY,
                linvel: Vec3::ZERO,
                angvel: Vec3::ZERO,
            };
            self.bodies.push((h, state, desc.mass));
            h
        }
        fn remove(&mut self, handle: BodyHandle) -> bool {
            let before = self.bodies.len();
            self.bodies.retain(|(h, _, _)| *h != handle);
            before != self.bodies.len()
        }
        fn clear(&mut self) {
            self.bodies.clear();
        }
        fn body(&self, handle: BodyHandle) -> Option<BodyState> {
            self.bodies
                .iter()
                .find(|(h, _, _)| *h == handle)
                .map(|(_, b, _)| *b)
        }
        fn launch(&mut self, handle: BodyHandle, throw: &Throw) -> bool {
            let Some((_, b, mass)) = self.bodies.iter_mut().find(|(h, _, _)| *h == handle) else {
                return false;
            };
            b.position = throw.position;
            b.orientation = throw.orientation;
            b.linvel = throw.linvel + throw.impulse / *mass;
            b.angvel = throw.angvel + throw.torque_impulse;
            true
        }
        fn step(&mut self, _dt: f32) {
            for (_, b, _) in self.bodies.iter_mut() {
                b.linvel = Vec3::ZERO;
                b.angvel = Vec3::ZERO;
            }
        }
    }

    fn still_scene() -> SceneDriver<StillWorld> {
        let launch = LaunchParams {
            stagger_secs: 0.0,
            ..Default::default()
        };
        SceneDriver::new(
            StillWorld::default(),
            DieBodyParams::default(),
            SettleThresholds::default(),
            launch,
            5,
        )
    }

    fn tray_scene(seed: u64) -> SceneDriver {
        SceneDriver::with_tray(
            Default::default(),
            DieBodyParams::default(),
            SettleThresholds::default(),
            LaunchParams::default(),
            seed,
        )
    }

    #[test]
    fn test_empty_roll_is_idle() {
        let mut scene = still_scene();
        let ticket = scene.present(&RollResult::empty());
        assert!(!scene.is_active());
        assert!(scene.frame(ticket, 0.016).is_empty());
        assert!(scene.views().is_empty());
        assert!(scene.tally().is_none());
    }

    #[test]
    fn test_settles_after_exactly_rest_frames() {
        let mut scene = still_scene();
        let roll = DiceRoller::seeded(1).generate_roll(3, 1);
        scene.present(&roll);

        for _ in 0..24 {
            assert!(scene.step(SIM_DT).is_empty());
        }
        let events = scene.step(SIM_DT);
        assert_eq!(events.len(), 4);
        assert!(scene.all_settled());
        assert!(!scene.is_active());
        assert_eq!(scene.settled().len(), 4);
    }

    #[test]
    fn test_settle_emitted_once() {
        let mut scene = still_scene();
        let roll = DiceRoller::seeded(2).generate_roll(2, 0);
        let ticket = scene.present(&roll);

        let mut events = Vec::new();
        for _ in 0..200 {
            events.extend(scene.frame(ticket, 1.0 / 60.0));
            // Force extra polling past the idle point
            events.extend(scene.step(SIM_DT));
        }
        assert_eq!(events.len(), 2);
        let ids: HashSet<_> = events.iter().map(|e| e.die).collect();
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn test_stale_ticket_discarded() {
        let mut scene = still_scene();
        let mut roller = DiceRoller::seeded(3);
        let old = scene.present(&roller.generate_roll(2, 0));
        let new = scene.present(&roller.generate_roll(3, 0));
        assert_ne!(old, new);

        for _ in 0..100 {
            assert!(scene.frame(old, 1.0 / 60.0).is_empty());
        }
        assert_eq!(scene.world().bodies.len(), 0);
        assert!(scene.settled().is_empty());
    }

    #[test]
    fn test_identical_roll_does_not_relaunch() {
        let mut scene = still_scene();
        let roll = DiceRoller::seeded(4).generate_roll(2, 1);
        let first = scene.present(&roll);
        let second = scene.present(&roll.clone());
        assert_eq!(first, second);
        assert_eq!(scene.generation(), 1);
    }

    #[test]
    fn test_reroll_clears_readings() {
        let mut scene = still_scene();
        let roll = DiceRoller::seeded(5).generate_roll(2, 0);
        scene.present(&roll);
        for _ in 0..30 {
            scene.step(SIM_DT);
        }
        assert_eq!(scene.settled().len(), 2);

        let ticket = scene.reroll();
        assert_eq!(ticket.generation(), 2);
        assert!(scene.settled().is_empty());
        assert!(scene.is_active());
        assert_eq!(scene.world().bodies.len(), 0);
    }

    #[test]
    fn test_missing_body_tolerated() {
        let mut scene = still_scene();
        let roll = DiceRoller::seeded(6).generate_roll(3, 0);
        scene.present(&roll);
        scene.step(SIM_DT);

        let victim = roll.dice()[1].id();
        let handle = scene.slots[1].handle.expect("launched");
        assert!(scene.world_mut().remove(handle));
        assert!(!scene.launch(victim));

        for _ in 0..50 {
            scene.step(SIM_DT);
        }
        assert_eq!(scene.settled().len(), 2);
        assert_eq!(scene.settled().get(victim), None);
        assert!(!scene.all_settled());
        assert!(!scene.is_active());
        assert!(scene.tally().is_none());
    }

    #[test]
    fn test_nan_frame_does_not_stall() {
        let mut scene = still_scene();
        let roll = DiceRoller::seeded(12).generate_roll(2, 1);
        let ticket = scene.present(&roll);

        assert!(scene.frame(ticket, f32::NAN).is_empty());
        assert!(scene.is_active());

        let mut events = Vec::new();
        for _ in 0..60 {
            events.extend(scene.frame(ticket, 1.0 / 60.0));
        }
        assert_eq!(events.len(), 3);
        assert!(scene.all_settled());
        assert!(!scene.is_active());
    }

    fn within(v: Vec3, range: &Range3) -> bool {
        v.cmpge(range.min).all() && v.cmple(range.max).all()
    }

    #[test]
    fn test_throws_respect_launch_ranges() {
        let params = LaunchParams::default();
        let mut rng = Pcg32::seed_from_u64(13);
        let mut wild = 0;

        for kind in [DieKind::Normal, DieKind::Distress] {
            for _ in 0..400 {
                let t = sample_throw(kind, &params, &mut rng);
                let flat = Vec3::new(t.position.x, 0.0, t.position.z).length();
                assert!(flat <= params.spawn_radius + 1e-4);
                assert!(t.position.y >= params.spawn_height_min);
                assert!(t.position.y <= params.spawn_height_max);
                assert!(t.orientation.is_normalized());

                let in_base = within(t.linvel, &params.linvel)
                    && within(t.angvel, &params.angvel)
                    && within(t.impulse, &params.impulse)
                    && within(t.torque_impulse, &params.torque_impulse);
                match kind {
                    DieKind::Normal => assert!(in_base),
                    DieKind::Distress => {
                        if !in_base {
                            wild += 1;
                        }
                    }
                }
            }
        }
        assert!(wild > 0);
    }

    #[test]
    fn test_launch_body_applies_throw() {
        let params = LaunchParams::default();
        let mut world = StillWorld::default();
        let h = world.insert(BodyDesc {
            mass: 1.0,
            hull: Vec::new(),
        });

        let mut rng = Pcg32::seed_from_u64(14);
        let expected = sample_throw(DieKind::Distress, &params, &mut rng.clone());
        assert!(launch_body(&mut world, h, DieKind::Distress, &params, &mut rng));

        let body = world.body(h).expect("inserted");
        assert_eq!(body.position, expected.position);
        assert_eq!(body.linvel, expected.linvel + expected.impulse);

        assert!(world.remove(h));
        assert!(!launch_body(&mut world, h, DieKind::Normal, &params, &mut rng));
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut scene = still_scene();
        let ticket = scene.present(&DiceRoller::seeded(7).generate_roll(1, 0));
        scene.cancel();
        scene.cancel();
        assert!(!scene.is_active());
        assert!(scene.frame(ticket, 0.05).is_empty());
    }

    #[test]
    fn test_views_keep_authoritative_values() {
        let mut scene = still_scene();
        let roll = DiceRoller::seeded(8).generate_roll(4, 2);
        scene.present(&roll);
        for _ in 0..30 {
            scene.step(SIM_DT);
        }
        let views = scene.views();
        let shown: Vec<u8> = views.iter().map(|v| v.authoritative_value).collect();
        assert_eq!(shown, roll.values().collect::<Vec<_>>());
        for v in &views {
            assert!(v.observed_value.is_some());
            assert_eq!(v.glow, tier(v.authoritative_value));
            assert_eq!(
                v.mismatch(),
                v.observed_value != Some(v.authoritative_value)
            );
        }
        assert_eq!(scene.tally(), roll.tally());
    }

    #[test]
    fn test_staggered_launch() {
        let mut scene = tray_scene(9);
        let roll = DiceRoller::seeded(9).generate_roll(3, 0);
        scene.present(&roll);
        scene.step(SIM_DT);
        let launched = scene.views().iter().filter(|v| v.position.is_some()).count();
        assert_eq!(launched, 1);
    }

    #[test]
    fn test_tray_roll_settles_every_die() {
        let mut scene = tray_scene(10);
        let roll = DiceRoller::seeded(10).generate_roll(5, 2);
        let ticket = scene.present(&roll);

        let mut events = Vec::new();
        // Settle timeout bounds the run well under 15 s
        for _ in 0..(15 * 60) {
            events.extend(scene.frame(ticket, 1.0 / 60.0));
        }

        assert!(scene.all_settled());
        assert_eq!(events.len(), 7);
        assert!(events.iter().all(|e| (1..=10).contains(&e.observed)));
        assert!(events.iter().all(|e| e.generation == ticket.generation()));
        assert_eq!(scene.tally(), roll.tally());
        for v in scene.views() {
            let p = v.position.expect("launched");
            assert!(p.is_finite());
            assert!(Vec3::new(p.x, 0.0, p.z).length() <= 6.5 + 1e-3);
        }
    }

    #[test]
    fn test_range_sample_bounds() {
        let mut rng = Pcg32::seed_from_u64(11);
        let range = Range3::new(Vec3::new(-1.0, 0.0, 2.0), Vec3::new(1.0, 1.0, 2.0));
        for _ in 0..200 {
            let v = range.sample(&mut rng, 1.0);
            assert!(v.x >= -1.0 && v.x <= 1.0);
            assert!(v.y >= 0.0 && v.y <= 1.0);
            assert_eq!(v.z, 2.0);
            let wide = range.sample(&mut rng, 2.0);
            assert!(wide.x >= -2.0 && wide.x <= 2.0);
        }
    }
}
