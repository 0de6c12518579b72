//! 2D "spinning digits" presentation
//!
//! Every die starts on a random face, re-rolls its displayed digit on a
//! kind-dependent tick and snaps to its authoritative value after a
//! staggered duration. Timers are tagged with the roll generation they were
//! scheduled for; a new roll bumps the generation so anything left over from
//! the previous roll is discarded when it fires.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::pool::{Die, DieId, DieKind, RollResult};
use crate::roll_d10;
use crate::tier::{RollTally, Tier, tier};
use crate::timers::{TimerId, TimerQueue};

/// Spinner cadence (milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpinnerTiming {
    /// Spin time of the first die
    pub base_ms: u64,
    /// Added per die position within a cycle
    pub stagger_ms: u64,
    /// Stagger restarts every `stagger_cycle` dice
    pub stagger_cycle: u32,
    pub tick_normal_ms: u64,
    pub tick_distress_ms: u64,
}

impl Default for SpinnerTiming {
    fn default() -> Self {
        Self {
            base_ms: 650,
            stagger_ms: 60,
            stagger_cycle: 6,
            tick_normal_ms: 55,
            tick_distress_ms: 45,
        }
    }
}

impl SpinnerTiming {
    /// How long the die at `index` spins (650..=950 ms by default)
    pub fn duration_ms(&self, index: usize) -> u64 {
        let cycle = self.stagger_cycle.max(1) as usize;
        self.base_ms + self.stagger_ms * (index % cycle) as u64
    }

    /// Digit refresh interval
    pub fn tick_ms(&self, kind: DieKind) -> u64 {
        let tick = match kind {
            DieKind::Normal => self.tick_normal_ms,
            DieKind::Distress => self.tick_distress_ms,
        };
        tick.max(1)
    }
}

/// Deferred spinner work, tagged with its roll generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinnerTimer {
    /// Show a new random digit
    Refresh { generation: u64, index: usize },
    /// Stop spinning and show the authoritative value
    Snap { generation: u64, index: usize },
}

impl SpinnerTimer {
    pub fn generation(&self) -> u64 {
        match self {
            SpinnerTimer::Refresh { generation, .. } | SpinnerTimer::Snap { generation, .. } => {
                *generation
            }
        }
    }
}

/// Display state of one die
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinnerDigit {
    die: Die,
    shown: u8,
    done: bool,
    refresh: Option<TimerId>,
    snap: Option<TimerId>,
}

impl SpinnerDigit {
    pub fn id(&self) -> DieId {
        self.die.id()
    }

    pub fn kind(&self) -> DieKind {
        self.die.kind()
    }

    /// Digit currently on screen
    pub fn shown(&self) -> u8 {
        self.shown
    }

    /// Border/result styling follows the authoritative value
    pub fn tier(&self) -> Tier {
        tier(self.die.value())
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Still showing something other than the final value
    pub fn is_rolling(&self) -> bool {
        !self.done
    }
}

/// 2D presentation of the current roll
#[derive(Debug, Clone, Default)]
pub struct SpinnerTray {
    timing: SpinnerTiming,
    generation: u64,
    roll: RollResult,
    digits: Vec<SpinnerDigit>,
}

impl SpinnerTray {
    pub fn new(timing: SpinnerTiming) -> Self {
        Self {
            timing,
            ..Default::default()
        }
    }

    pub fn timing(&self) -> &SpinnerTiming {
        &self.timing
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn roll(&self) -> &RollResult {
        &self.roll
    }

    /// Start animating `roll`, tearing down whatever was running.
    ///
    /// Presenting the same dice again leaves the running animation alone.
    pub fn present<R: Rng + ?Sized>(
        &mut self,
        roll: &RollResult,
        timers: &mut TimerQueue<SpinnerTimer>,
        rng: &mut R,
    ) {
        if self.generation > 0 && self.roll == *roll {
            return;
        }

        self.teardown(timers);
        self.generation += 1;
        self.roll = roll.clone();

        let generation = self.generation;
        let timing = self.timing;
        self.digits = roll
            .dice()
            .iter()
            .enumerate()
            .map(|(index, die)| {
                let refresh = timers.schedule(
                    timing.tick_ms(die.kind()),
                    SpinnerTimer::Refresh { generation, index },
                );
                let snap = timers.schedule(
                    timing.duration_ms(index),
                    SpinnerTimer::Snap { generation, index },
                );
                SpinnerDigit {
                    die: *die,
                    shown: roll_d10(rng),
                    done: false,
                    refresh: Some(refresh),
                    snap: Some(snap),
                }
            })
            .collect();

        log::debug!(
            "Spinner started for {} dice (generation {})",
            self.digits.len(),
            generation
        );
    }

    /// Drop the current roll and every pending timer
    pub fn clear(&mut self, timers: &mut TimerQueue<SpinnerTimer>) {
        self.teardown(timers);
        self.generation += 1;
        self.roll = RollResult::empty();
    }

    fn teardown(&mut self, timers: &mut TimerQueue<SpinnerTimer>) {
        for digit in self.digits.drain(..) {
            if let Some(id) = digit.refresh {
                timers.cancel(id);
            }
            if let Some(id) = digit.snap {
                timers.cancel(id);
            }
        }
    }

    /// Handle a fired timer. Returns false if it was stale or a no-op.
    pub fn on_timer<R: Rng + ?Sized>(
        &mut self,
        timer: SpinnerTimer,
        timers: &mut TimerQueue<SpinnerTimer>,
        rng: &mut R,
    ) -> bool {
        if timer.generation() != self.generation {
            log::trace!(
                "Discarding stale spinner timer {:?} (current generation {})",
                timer,
                self.generation
            );
            return false;
        }

        match timer {
            SpinnerTimer::Refresh { generation, index } => {
                let Some(digit) = self.digits.get_mut(index) else {
                    return false;
                };
                if digit.done {
                    return false;
                }
                let tick = self.timing.tick_ms(digit.kind());
                digit.shown = roll_d10(rng);
                digit.refresh =
                    Some(timers.schedule(tick, SpinnerTimer::Refresh { generation, index }));
                true
            }
            SpinnerTimer::Snap { index, .. } => {
                let Some(digit) = self.digits.get_mut(index) else {
                    return false;
                };
                if let Some(id) = digit.refresh.take() {
                    timers.cancel(id);
                }
                digit.snap = None;
                digit.shown = digit.die.value();
                digit.done = true;

                if self.is_done() {
                    log::debug!("Spinner finished (generation {})", self.generation);
                }
                true
            }
        }
    }

    pub fn digits(&self) -> &[SpinnerDigit] {
        &self.digits
    }

    /// Digit currently shown for `id`
    pub fn shown(&self, id: DieId) -> Option<u8> {
        self.digits.iter().find(|d| d.id() == id).map(|d| d.shown)
    }

    pub fn is_rolling(&self) -> bool {
        self.digits.iter().any(|d| !d.done)
    }

    /// Every die shows its final value (trivially true with no dice)
    pub fn is_done(&self) -> bool {
        !self.is_rolling()
    }

    /// Tallies of the authoritative values, available immediately
    pub fn tally(&self) -> Option<RollTally> {
        self.roll.tally()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DiceRoller;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    /// Advance the queue in 5 ms slices, dispatching everything due
    fn run_for(
        tray: &mut SpinnerTray,
        timers: &mut TimerQueue<SpinnerTimer>,
        rng: &mut Pcg32,
        ms: u64,
    ) -> (usize, usize) {
        let mut applied = 0;
        let mut stale = 0;
        for _ in 0..(ms / 5) {
            timers.advance(5);
            while let Some((_, timer)) = timers.pop_due() {
                if tray.on_timer(timer, timers, rng) {
                    applied += 1;
                } else {
                    stale += 1;
                }
            }
        }
        (applied, stale)
    }

    #[test]
    fn test_timing_defaults() {
        let t = SpinnerTiming::default();
        assert_eq!(t.duration_ms(0), 650);
        assert_eq!(t.duration_ms(5), 950);
        assert_eq!(t.duration_ms(6), 650);
        assert!(t.tick_ms(DieKind::Distress) < t.tick_ms(DieKind::Normal));
    }

    #[test]
    fn test_converges_to_authoritative_values() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut timers = TimerQueue::new();
        let mut tray = SpinnerTray::default();
        let roll = DiceRoller::seeded(1).generate_roll(5, 2);

        tray.present(&roll, &mut timers, &mut rng);
        assert!(tray.is_rolling());
        assert_eq!(tray.tally(), roll.tally());

        run_for(&mut tray, &mut timers, &mut rng, 1000);

        assert!(tray.is_done());
        for die in roll.dice() {
            assert_eq!(tray.shown(die.id()), Some(die.value()));
        }
        assert!(timers.is_empty());
    }

    #[test]
    fn test_still_spinning_before_duration() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mut timers = TimerQueue::new();
        let mut tray = SpinnerTray::default();
        tray.present(
            &DiceRoller::seeded(2).generate_roll(1, 0),
            &mut timers,
            &mut rng,
        );

        let (applied, _) = run_for(&mut tray, &mut timers, &mut rng, 640);
        assert!(tray.is_rolling());
        // 55 ms cadence over 640 ms
        assert_eq!(applied, 11);

        run_for(&mut tray, &mut timers, &mut rng, 10);
        assert!(tray.is_done());
    }

    #[test]
    fn test_new_roll_mid_flight() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut timers = TimerQueue::new();
        let mut tray = SpinnerTray::default();
        let mut roller = DiceRoller::seeded(3);

        let first = roller.generate_roll(6, 3);
        tray.present(&first, &mut timers, &mut rng);
        run_for(&mut tray, &mut timers, &mut rng, 300);
        assert!(tray.is_rolling());

        let second = roller.generate_roll(2, 1);
        tray.present(&second, &mut timers, &mut rng);
        run_for(&mut tray, &mut timers, &mut rng, 2000);

        assert!(tray.is_done());
        assert_eq!(tray.digits().len(), 3);
        for die in second.dice() {
            assert_eq!(tray.shown(die.id()), Some(die.value()));
        }
        for die in first.dice() {
            assert_eq!(tray.shown(die.id()), None);
        }
    }

    #[test]
    fn test_stale_timer_is_discarded() {
        let mut rng = Pcg32::seed_from_u64(4);
        let mut timers = TimerQueue::new();
        let mut tray = SpinnerTray::default();
        let mut roller = DiceRoller::seeded(4);

        tray.present(&roller.generate_roll(2, 0), &mut timers, &mut rng);
        let second = roller.generate_roll(2, 0);
        tray.present(&second, &mut timers, &mut rng);
        let before: Vec<u8> = tray.digits().iter().map(|d| d.shown()).collect();

        // A timer from the first roll that escaped cancellation
        let stale = SpinnerTimer::Snap {
            generation: 1,
            index: 0,
        };
        assert!(!tray.on_timer(stale, &mut timers, &mut rng));
        let after: Vec<u8> = tray.digits().iter().map(|d| d.shown()).collect();
        assert_eq!(before, after);
        assert!(tray.is_rolling());
    }

    #[test]
    fn test_identical_roll_keeps_animation() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut timers = TimerQueue::new();
        let mut tray = SpinnerTray::default();
        let roll = DiceRoller::seeded(5).generate_roll(3, 0);

        tray.present(&roll, &mut timers, &mut rng);
        let pending = timers.len();
        tray.present(&roll.clone(), &mut timers, &mut rng);
        assert_eq!(tray.generation(), 1);
        assert_eq!(timers.len(), pending);
    }

    #[test]
    fn test_empty_roll_and_clear() {
        let mut rng = Pcg32::seed_from_u64(6);
        let mut timers = TimerQueue::new();
        let mut tray = SpinnerTray::default();

        tray.present(&RollResult::empty(), &mut timers, &mut rng);
        assert!(tray.is_done());
        assert!(tray.tally().is_none());
        assert!(timers.is_empty());

        tray.present(
            &DiceRoller::seeded(6).generate_roll(4, 1),
            &mut timers,
            &mut rng,
        );
        assert!(!timers.is_empty());
        tray.clear(&mut timers);
        tray.clear(&mut timers);
        assert!(timers.is_empty());
        assert!(tray.digits().is_empty());
        assert!(tray.tally().is_none());
    }

    #[test]
    fn test_distress_ticks_faster() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut timers = TimerQueue::new();
        let mut tray = SpinnerTray::default();
        tray.present(
            &DiceRoller::seeded(7).generate_roll(0, 1),
            &mut timers,
            &mut rng,
        );
        let (applied, _) = run_for(&mut tray, &mut timers, &mut rng, 640);
        // 45 ms cadence over 640 ms
        assert_eq!(applied, 14);
    }
}
