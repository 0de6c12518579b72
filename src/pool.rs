//! Pool arithmetic and authoritative die generation
//!
//! A roll's face values are drawn once, synchronously, before any
//! presentation starts. Everything downstream only animates toward them.

use std::fmt;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::roll_d10;
use crate::tier::{RollTally, tally};

/// Opaque die identifier, never reused by the roller that minted it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DieId(pub u64);

impl fmt::Display for DieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "die-{}", self.0)
    }
}

/// Die category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DieKind {
    #[default]
    Normal,
    /// Extra die sized by the character's distress level
    Distress,
}

impl DieKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DieKind::Normal => "normal",
            DieKind::Distress => "distress",
        }
    }
}

/// A rolled die. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Die {
    id: DieId,
    value: u8,
    kind: DieKind,
}

impl Die {
    /// Build a die with a known face (value is clamped to 1..=10)
    pub fn new(id: DieId, value: u8, kind: DieKind) -> Self {
        Self {
            id,
            value: value.clamp(1, crate::consts::FACE_COUNT),
            kind,
        }
    }

    pub fn id(&self) -> DieId {
        self.id
    }

    /// Authoritative face value
    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn kind(&self) -> DieKind {
        self.kind
    }
}

/// Number of dice to roll for one check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PoolSize {
    pub normal: u32,
    pub distress: u32,
}

impl PoolSize {
    pub fn total(&self) -> u32 {
        self.normal.saturating_add(self.distress)
    }

    /// Nothing to roll; the UI should disable the roll action
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Compute pool sizes from two stat values, a modifier and the distress level.
///
/// Negative sums clamp to zero normal dice. Distress dice are only added when
/// requested.
pub fn compute_pool(
    stat_a: u32,
    stat_b: u32,
    modifier: i32,
    distress_level: u8,
    include_distress: bool,
) -> PoolSize {
    let raw = i64::from(stat_a) + i64::from(stat_b) + i64::from(modifier);
    let normal = raw.clamp(0, i64::from(u32::MAX)) as u32;
    let distress = if include_distress {
        u32::from(distress_level)
    } else {
        0
    };
    PoolSize { normal, distress }
}

/// Ordered dice of one roll: normal dice first, then distress dice
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RollResult {
    dice: Vec<Die>,
}

impl RollResult {
    /// The empty roll ("nothing to report")
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap an existing sequence, restoring the normal-then-distress order
    pub fn from_dice(mut dice: Vec<Die>) -> Self {
        // Stable: keeps generation order within each kind
        dice.sort_by_key(|d| d.kind == DieKind::Distress);
        Self { dice }
    }

    pub fn dice(&self) -> &[Die] {
        &self.dice
    }

    pub fn len(&self) -> usize {
        self.dice.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dice.is_empty()
    }

    pub fn get(&self, id: DieId) -> Option<&Die> {
        self.dice.iter().find(|d| d.id == id)
    }

    pub fn normal(&self) -> impl Iterator<Item = &Die> {
        self.dice.iter().filter(|d| d.kind == DieKind::Normal)
    }

    pub fn distress(&self) -> impl Iterator<Item = &Die> {
        self.dice.iter().filter(|d| d.kind == DieKind::Distress)
    }

    /// Authoritative face values in roll order
    pub fn values(&self) -> impl Iterator<Item = u8> + '_ {
        self.dice.iter().map(|d| d.value)
    }

    /// Tallies over the authoritative values, `None` for an empty roll
    pub fn tally(&self) -> Option<RollTally> {
        tally(self.values())
    }
}

/// Authoritative die generator.
///
/// Generic over the RNG so tests can substitute a seeded generator.
#[derive(Debug, Clone)]
pub struct DiceRoller<R: Rng = Pcg32> {
    rng: R,
    next_id: u64,
}

impl DiceRoller<Pcg32> {
    /// Deterministic roller for tests and replays
    pub fn seeded(seed: u64) -> Self {
        Self::new(Pcg32::seed_from_u64(seed))
    }

    /// Roller seeded from the thread-local entropy source
    pub fn from_entropy() -> Self {
        Self::new(Pcg32::from_rng(&mut rand::rng()))
    }
}

impl<R: Rng> DiceRoller<R> {
    pub fn new(rng: R) -> Self {
        Self { rng, next_id: 1 }
    }

    /// Allocate a fresh die identifier
    fn next_die_id(&mut self) -> DieId {
        let id = DieId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Draw `normal_count` normal dice then `distress_count` distress dice
    pub fn generate_roll(&mut self, normal_count: u32, distress_count: u32) -> RollResult {
        let total = normal_count as usize + distress_count as usize;
        let mut dice = Vec::with_capacity(total);

        for _ in 0..normal_count {
            let id = self.next_die_id();
            dice.push(Die::new(id, roll_d10(&mut self.rng), DieKind::Normal));
        }
        for _ in 0..distress_count {
            let id = self.next_die_id();
            dice.push(Die::new(id, roll_d10(&mut self.rng), DieKind::Distress));
        }

        RollResult { dice }
    }

    /// Roll a computed pool
    pub fn roll_pool(&mut self, pool: PoolSize) -> RollResult {
        self.generate_roll(pool.normal, pool.distress)
    }

    /// Borrow the generator (presentation randomness can share it)
    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }
}
