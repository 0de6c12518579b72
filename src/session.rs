//! The current roll
//!
//! A `RollSession` owns the authoritative roll and both presentations of it.
//! Every roll replaces the previous one wholesale: the spinner and the scene
//! are rebuilt before anything is shown, so nothing from an older roll can
//! write into the new one.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::pool::{DiceRoller, PoolSize, RollResult};
use crate::settings::TraySettings;
use crate::sim::{FrameTicket, SceneDriver, SettleEvent, TrayWorld};
use crate::spinner::{SpinnerTimer, SpinnerTray};
use crate::stats::{RollConfiguration, StatSnapshot};
use crate::tier::RollTally;
use crate::timers::TimerQueue;

/// Roll state plus its 2D and 3D presentations
#[derive(Debug)]
pub struct RollSession {
    settings: TraySettings,
    roller: DiceRoller,
    roll: RollResult,
    spinner: SpinnerTray,
    timers: TimerQueue<SpinnerTimer>,
    /// Cosmetic digits only, kept apart from the authoritative stream
    spinner_rng: Pcg32,
    scene: SceneDriver<TrayWorld>,
    ticket: FrameTicket,
    /// Fraction of a millisecond not yet fed to the timer queue
    ms_remainder: f64,
}

impl RollSession {
    /// Deterministic session
    pub fn new(settings: TraySettings, seed: u64) -> Self {
        let mut scene = SceneDriver::with_tray(
            settings.physics,
            settings.dice,
            settings.settle,
            settings.launch,
            seed.wrapping_add(2),
        );
        let ticket = scene.present(&RollResult::empty());

        Self {
            settings,
            roller: DiceRoller::seeded(seed),
            roll: RollResult::empty(),
            spinner: SpinnerTray::new(settings.spinner),
            timers: TimerQueue::new(),
            spinner_rng: Pcg32::seed_from_u64(seed.wrapping_add(1)),
            scene,
            ticket,
            ms_remainder: 0.0,
        }
    }

    /// Session seeded from the thread-local entropy source
    pub fn from_entropy(settings: TraySettings) -> Self {
        Self::new(settings, rand::rng().random())
    }

    /// Roll for a character. Returns None (and changes nothing) when the
    /// pool is empty.
    pub fn roll(
        &mut self,
        snapshot: &StatSnapshot,
        config: &RollConfiguration,
    ) -> Option<&RollResult> {
        let pool = config.pool(snapshot);
        log::debug!(
            "Pool for {} + {} ({:+}): {} normal, {} distress",
            config.stat_a.label(),
            config.stat_b.label(),
            config.modifier,
            pool.normal,
            pool.distress
        );
        self.roll_pool(pool)
    }

    /// Roll an explicit pool
    pub fn roll_pool(&mut self, pool: PoolSize) -> Option<&RollResult> {
        if pool.is_empty() {
            log::debug!("Empty pool, nothing to roll");
            return None;
        }

        let roll = self.roller.roll_pool(pool);
        log::info!(
            "Rolled {} dice ({} normal, {} distress): {:?}",
            roll.len(),
            pool.normal,
            pool.distress,
            roll.values().collect::<Vec<_>>()
        );

        self.roll = roll;
        self.spinner
            .present(&self.roll, &mut self.timers, &mut self.spinner_rng);
        self.ticket = self.scene.present(&self.roll);
        Some(&self.roll)
    }

    /// Throw the current dice again in the 3D tray. The roll itself stays.
    pub fn reroll_3d(&mut self) -> FrameTicket {
        if !self.roll.is_empty() {
            self.ticket = self.scene.reroll();
        }
        self.ticket
    }

    /// Drop the current roll and stop both presentations
    pub fn clear(&mut self) {
        self.roll = RollResult::empty();
        self.spinner.clear(&mut self.timers);
        self.scene.cancel();
        self.ticket = self.scene.present(&self.roll);
        log::info!("Roll cleared");
    }

    /// Advance both presentations by one host frame
    pub fn frame(&mut self, dt_secs: f32) -> Vec<SettleEvent> {
        let dt_secs = dt_secs.max(0.0);

        let ms = f64::from(dt_secs) * 1000.0 + self.ms_remainder;
        let whole = ms.floor();
        self.ms_remainder = ms - whole;
        self.timers.advance(whole as u64);

        while let Some((_, timer)) = self.timers.pop_due() {
            self.spinner
                .on_timer(timer, &mut self.timers, &mut self.spinner_rng);
        }

        self.scene.frame(self.ticket, dt_secs)
    }

    pub fn settings(&self) -> &TraySettings {
        &self.settings
    }

    pub fn current(&self) -> &RollResult {
        &self.roll
    }

    pub fn spinner(&self) -> &SpinnerTray {
        &self.spinner
    }

    pub fn scene(&self) -> &SceneDriver<TrayWorld> {
        &self.scene
    }

    pub fn ticket(&self) -> FrameTicket {
        self.ticket
    }

    /// Authoritative tallies (absent when nothing was rolled)
    pub fn tally(&self) -> Option<RollTally> {
        self.roll.tally()
    }

    /// Tallies for the 3D view, absent until every die has settled
    pub fn tally_3d(&self) -> Option<RollTally> {
        self.scene.tally()
    }

    /// Either presentation still needs frames
    pub fn is_animating(&self) -> bool {
        self.spinner.is_rolling() || self.scene.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatKey;

    fn snapshot() -> StatSnapshot {
        StatSnapshot::default()
            .with_stat(StatKey::Charisme, 2)
            .with_stat(StatKey::Persuasion, 3)
            .with_distress(2)
    }

    fn run(session: &mut RollSession, secs: u32) -> Vec<SettleEvent> {
        let mut events = Vec::new();
        for _ in 0..(secs * 60) {
            events.extend(session.frame(1.0 / 60.0));
        }
        events
    }

    #[test]
    fn test_empty_pool_is_noop() {
        let mut session = RollSession::new(TraySettings::default(), 1);
        let config = RollConfiguration {
            modifier: -1,
            include_distress: false,
            ..Default::default()
        };
        assert!(session.roll(&StatSnapshot::default(), &config).is_none());
        assert!(session.current().is_empty());
        assert!(session.tally().is_none());
        assert!(!session.is_animating());
    }

    #[test]
    fn test_full_roll_converges() {
        let mut session = RollSession::new(TraySettings::default(), 2);
        let roll = session
            .roll(&snapshot(), &RollConfiguration::default())
            .cloned()
            .expect("seven dice");
        assert_eq!(roll.len(), 7);
        assert_eq!(roll.distress().count(), 2);
        assert!(session.is_animating());
        assert!(session.tally_3d().is_none());

        let events = run(&mut session, 15);

        assert!(!session.is_animating());
        assert_eq!(events.len(), 7);
        for die in roll.dice() {
            assert_eq!(session.spinner().shown(die.id()), Some(die.value()));
        }
        assert_eq!(session.tally_3d(), session.tally());
        assert_eq!(session.current(), &roll);
    }

    #[test]
    fn test_new_roll_replaces_old() {
        let mut session = RollSession::new(TraySettings::default(), 3);
        let config = RollConfiguration::default();
        session.roll(&snapshot(), &config);
        for _ in 0..10 {
            session.frame(1.0 / 60.0);
        }

        let second = session
            .roll(&snapshot(), &config)
            .cloned()
            .expect("dice");
        let events = run(&mut session, 15);

        assert!(events.iter().all(|e| e.generation == session.ticket().generation()));
        assert_eq!(session.spinner().digits().len(), second.len());
        for die in second.dice() {
            assert_eq!(session.spinner().shown(die.id()), Some(die.value()));
        }
    }

    #[test]
    fn test_reroll_keeps_outcome() {
        let mut session = RollSession::new(TraySettings::default(), 4);
        let roll = session
            .roll_pool(PoolSize {
                normal: 3,
                distress: 0,
            })
            .cloned()
            .expect("dice");
        let before = session.ticket();
        let after = session.reroll_3d();
        assert_ne!(before, after);
        assert_eq!(session.current(), &roll);
        assert!(session.scene().settled().is_empty());
    }

    #[test]
    fn test_clear() {
        let mut session = RollSession::new(TraySettings::default(), 5);
        session.roll(&snapshot(), &RollConfiguration::default());
        session.clear();
        assert!(session.current().is_empty());
        assert!(session.tally().is_none());
        assert!(session.tally_3d().is_none());
        assert!(!session.is_animating());
        assert!(session.frame(0.1).is_empty());
    }

    #[test]
    fn test_same_seed_same_roll() {
        let mut a = RollSession::new(TraySettings::default(), 42);
        let mut b = RollSession::new(TraySettings::default(), 42);
        let config = RollConfiguration::default();
        assert_eq!(
            a.roll(&snapshot(), &config).cloned(),
            b.roll(&snapshot(), &config).cloned()
        );
    }
}
