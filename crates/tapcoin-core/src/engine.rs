//! The tap engine: points, energy, and live tap events for one view.
//!
//! The engine is a plain synchronous state machine. It owns two saturating
//! counters with exactly two mutation entry points, [`TapEngine::tap`] and
//! [`TapEngine::regenerate`], plus the ordered list of live tap events the
//! page animates.
//!
//! # Invariants
//!
//! - `0 <= energy <= energy_max` after every operation.
//! - `points` never decreases; each accepted tap adds exactly
//!   `points_per_tap`.
//! - A rejected tap changes nothing and creates no event.
//! - Event tokens are strictly increasing in creation order.

use chrono::Utc;
use tapcoin_types::{FloatingLabel, Position, TapEvent, TapEventId, TapOutcome};

use crate::rules::GameRules;

/// Points, energy, and live tap events for one view.
#[derive(Debug, Clone)]
pub struct TapEngine {
    rules: GameRules,
    points: u64,
    energy: u32,
    /// Live events, oldest first.
    events: Vec<TapEvent>,
    last_event_id: Option<TapEventId>,
}

impl TapEngine {
    /// Engine for a fresh account: no points, starting energy.
    pub fn new(rules: GameRules) -> Self {
        let energy = rules.starting_energy;
        Self::restore(rules, 0, energy)
    }

    /// Engine resuming persisted totals. `energy` is clamped to the
    /// configured maximum.
    pub fn restore(rules: GameRules, points: u64, energy: u32) -> Self {
        let energy = energy.min(rules.energy_max);
        Self {
            rules,
            points,
            energy,
            events: Vec::new(),
            last_event_id: None,
        }
    }

    /// Replace the totals, keeping live events (used after sign-in).
    pub fn load(&mut self, points: u64, energy: u32) {
        self.points = points;
        self.energy = energy.min(self.rules.energy_max);
    }

    /// Tap at `position` using the wall clock for the event token.
    pub fn tap(&mut self, position: Position) -> TapOutcome {
        let now_ms = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        self.tap_at(position, now_ms)
    }

    /// Tap at `position` as if the wall clock read `now_ms`.
    ///
    /// Rejected without any change if energy is below the tap cost.
    pub fn tap_at(&mut self, position: Position, now_ms: u64) -> TapOutcome {
        if self.energy < self.rules.energy_per_tap {
            return TapOutcome::Rejected {
                energy: self.energy,
                required: self.rules.energy_per_tap,
            };
        }

        self.points = self.points.saturating_add(self.rules.points_per_tap);
        self.energy = self.energy.saturating_sub(self.rules.energy_per_tap);

        let id = TapEventId::next(self.last_event_id, now_ms);
        self.last_event_id = Some(id);
        let event = TapEvent { id, position };
        self.events.push(event);

        TapOutcome::Accepted {
            points: self.points,
            energy: self.energy,
            event,
        }
    }

    /// Remove the event with `id`. Returns whether it was live.
    ///
    /// Expiring an unknown or already-expired event is a no-op.
    pub fn expire_event(&mut self, id: TapEventId) -> bool {
        let before = self.events.len();
        self.events.retain(|event| event.id != id);
        self.events.len() != before
    }

    /// One regeneration tick: add `regen_amount` energy, saturating at the
    /// maximum. Returns the new energy.
    pub fn regenerate(&mut self) -> u32 {
        self.energy = self
            .energy
            .saturating_add(self.rules.regen_amount)
            .min(self.rules.energy_max);
        self.energy
    }

    /// Accumulated points.
    pub const fn points(&self) -> u64 {
        self.points
    }

    /// Current energy.
    pub const fn energy(&self) -> u32 {
        self.energy
    }

    /// Live tap events, oldest first.
    pub fn live_events(&self) -> &[TapEvent] {
        &self.events
    }

    /// Floating labels for the live events.
    pub fn labels(&self) -> Vec<FloatingLabel> {
        self.events
            .iter()
            .map(|event| {
                FloatingLabel::for_event(
                    event,
                    self.rules.points_per_tap,
                    self.rules.float_duration_ms,
                )
            })
            .collect()
    }

    /// Energy as a percentage of the maximum, for the energy bar.
    pub fn energy_percent(&self) -> f64 {
        if self.rules.energy_max == 0 {
            return 0.0;
        }
        f64::from(self.energy) / f64::from(self.rules.energy_max) * 100.0
    }

    /// The rules this engine plays by.
    pub const fn rules(&self) -> &GameRules {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f32, y: f32) -> Position {
        Position { x, y }
    }

    #[test]
    fn fresh_engine_starts_with_starting_energy() {
        let engine = TapEngine::new(GameRules::default());
        assert_eq!(engine.points(), 0);
        assert_eq!(engine.energy(), 2532);
        assert!(engine.live_events().is_empty());
    }

    #[test]
    fn accepted_tap_moves_both_counters() {
        let mut engine = TapEngine::restore(GameRules::default(), 100, 500);
        let outcome = engine.tap_at(at(10.0, 20.0), 1_000);

        match outcome {
            TapOutcome::Accepted {
                points,
                energy,
                event,
            } => {
                assert_eq!(points, 112);
                assert_eq!(energy, 488);
                assert_eq!(event.position, at(10.0, 20.0));
                assert_eq!(event.id, TapEventId(1_000));
            }
            TapOutcome::Rejected { .. } => panic!("tap should be accepted"),
        }
        assert_eq!(engine.live_events().len(), 1);
    }

    #[test]
    fn five_taps_from_fresh_account() {
        let mut engine = TapEngine::new(GameRules::default());
        for i in 0..5_u64 {
            assert!(engine.tap_at(at(0.0, 0.0), 1_000 + i).is_accepted());
        }
        assert_eq!(engine.points(), 60);
        assert_eq!(engine.energy(), 2472);
        assert_eq!(engine.live_events().len(), 5);
    }

    #[test]
    fn low_energy_rejects_without_change() {
        let mut engine = TapEngine::restore(GameRules::default(), 7, 6);
        let outcome = engine.tap_at(at(1.0, 1.0), 1_000);

        assert_eq!(
            outcome,
            TapOutcome::Rejected {
                energy: 6,
                required: 12
            }
        );
        assert_eq!(engine.points(), 7);
        assert_eq!(engine.energy(), 6);
        assert!(engine.live_events().is_empty());
    }

    #[test]
    fn exactly_one_tap_of_energy_is_enough() {
        let mut engine = TapEngine::restore(GameRules::default(), 0, 12);
        assert!(engine.tap_at(at(0.0, 0.0), 1).is_accepted());
        assert_eq!(engine.energy(), 0);
        assert!(!engine.tap_at(at(0.0, 0.0), 2).is_accepted());
    }

    #[test]
    fn regenerate_saturates_at_max() {
        let mut engine = TapEngine::restore(GameRules::default(), 0, 6490);
        for _ in 0..20 {
            engine.regenerate();
        }
        assert_eq!(engine.energy(), 6500);
    }

    #[test]
    fn regenerate_adds_one() {
        let mut engine = TapEngine::restore(GameRules::default(), 0, 100);
        assert_eq!(engine.regenerate(), 101);
    }

    #[test]
    fn restore_clamps_energy() {
        let engine = TapEngine::restore(GameRules::default(), 0, 9_999);
        assert_eq!(engine.energy(), 6500);
    }

    #[test]
    fn expire_event_is_idempotent() {
        let mut engine = TapEngine::new(GameRules::default());
        let first = engine.tap_at(at(0.0, 0.0), 10);
        engine.tap_at(at(5.0, 5.0), 20);
        let TapOutcome::Accepted { event, .. } = first else {
            panic!("tap should be accepted");
        };

        assert!(engine.expire_event(event.id));
        let after_once = engine.live_events().to_vec();
        assert!(!engine.expire_event(event.id));
        assert_eq!(engine.live_events(), after_once.as_slice());
        assert_eq!(engine.live_events().len(), 1);
    }

    #[test]
    fn event_ids_strictly_increase_within_one_millisecond() {
        let mut engine = TapEngine::new(GameRules::default());
        for _ in 0..3 {
            engine.tap_at(at(0.0, 0.0), 5_000);
        }
        let ids: Vec<u64> = engine.live_events().iter().map(|e| e.id.0).collect();
        assert_eq!(ids, vec![5_000, 5_001, 5_002]);
    }

    #[test]
    fn labels_are_offset_from_tap_point() {
        let mut engine = TapEngine::new(GameRules::default());
        engine.tap_at(at(100.0, 80.0), 1);
        let labels = engine.labels();
        assert_eq!(labels.len(), 1);
        let label = labels.first().cloned();
        assert_eq!(label.as_ref().map(|l| l.text.as_str()), Some("+12"));
        assert_eq!(label.as_ref().map(|l| l.top), Some(38.0));
        assert_eq!(label.as_ref().map(|l| l.left), Some(72.0));
        assert_eq!(label.map(|l| l.duration_ms), Some(1_000));
    }

    #[test]
    fn energy_percent_tracks_meter() {
        let engine = TapEngine::restore(GameRules::default(), 0, 3250);
        assert!((engine.energy_percent() - 50.0).abs() < f64::EPSILON);
    }
}
