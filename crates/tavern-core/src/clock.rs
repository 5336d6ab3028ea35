//! Simulation Clock
//!
//! Converts real elapsed time into whole simulated seconds and advances the
//! authoritative timestamp one second at a time, so no hour or day boundary
//! is ever skipped regardless of the time multiplier.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use tavern_events::SimTime;

/// Clock constants
pub mod clock_constants {
    /// Simulated seconds per real second at multiplier 1
    pub const SIM_SECONDS_PER_REAL_SECOND: f64 = 60.0;
    /// Upper bound of the time multiplier
    pub const MAX_TIME_MULTIPLIER: f32 = 10.0;
}

use clock_constants::*;

/// What a single one-second tick produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockSignal {
    pub now: SimTime,
    /// Set to the new day index when this tick crossed midnight
    pub new_day: Option<u64>,
}

/// Authoritative simulated time.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimClock {
    now: SimTime,
    multiplier: f32,
    /// Simulated seconds owed but not yet ticked
    #[serde(skip)]
    accumulator: f64,
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(SimTime::ZERO)
    }
}

impl SimClock {
    pub fn new(start: SimTime) -> Self {
        Self {
            now: start,
            multiplier: 1.0,
            accumulator: 0.0,
        }
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn multiplier(&self) -> f32 {
        self.multiplier
    }

    pub fn is_paused(&self) -> bool {
        self.multiplier == 0.0
    }

    /// Sets the time multiplier, clamped to [0, 10]. Zero freezes time.
    pub fn set_multiplier(&mut self, value: f32) {
        if value.is_nan() {
            tracing::warn!("Ignoring NaN time multiplier");
            return;
        }
        self.multiplier = value.clamp(0.0, MAX_TIME_MULTIPLIER);
    }

    /// Adds real elapsed time and returns how many whole simulated seconds are
    /// now due. The caller ticks that many times.
    pub fn advance(&mut self, real_seconds: f64) -> u64 {
        if !real_seconds.is_finite() || real_seconds <= 0.0 {
            if real_seconds < 0.0 || real_seconds.is_nan() {
                tracing::warn!("Ignoring invalid clock advance of {} real seconds", real_seconds);
            }
            return 0;
        }

        self.accumulator +=
            real_seconds * SIM_SECONDS_PER_REAL_SECOND * self.multiplier as f64;
        let whole = self.accumulator.floor();
        self.accumulator -= whole;
        whole as u64
    }

    /// Moves time forward by exactly one simulated second.
    pub fn tick(&mut self) -> ClockSignal {
        let previous_day = self.now.day_index();
        self.now = self.now.plus_seconds(1);
        let day = self.now.day_index();
        ClockSignal {
            now: self.now,
            new_day: (day != previous_day).then_some(day),
        }
    }

    /// Replaces the clock state from a save. Pending fractional time is dropped.
    pub fn restore(&mut self, now: SimTime, multiplier: f32) {
        self.now = now;
        self.accumulator = 0.0;
        self.set_multiplier(multiplier);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiplier_clamps() {
        let mut clock = SimClock::default();
        clock.set_multiplier(16.0);
        assert_eq!(clock.multiplier(), MAX_TIME_MULTIPLIER);
        clock.set_multiplier(-3.0);
        assert_eq!(clock.multiplier(), 0.0);
        assert!(clock.is_paused());
        clock.set_multiplier(f32::NAN);
        assert_eq!(clock.multiplier(), 0.0);
    }

    #[test]
    fn test_advance_converts_real_to_sim_seconds() {
        let mut clock = SimClock::default();
        assert_eq!(clock.advance(1.0), 60);

        clock.set_multiplier(10.0);
        assert_eq!(clock.advance(0.5), 300);
    }

    #[test]
    fn test_advance_accumulates_fractions() {
        let mut clock = SimClock::default();
        // 1/64 real second = 0.9375 simulated seconds
        let step = 1.0 / 64.0;
        assert_eq!(clock.advance(step), 0);
        assert_eq!(clock.advance(step), 1);
        assert_eq!(clock.advance(step), 1);
    }

    #[test]
    fn test_paused_clock_does_not_advance() {
        let mut clock = SimClock::default();
        clock.set_multiplier(0.0);
        assert_eq!(clock.advance(100.0), 0);
        assert_eq!(clock.advance(-1.0), 0);
    }

    #[test]
    fn test_tick_raises_new_day_once() {
        let mut clock = SimClock::new(SimTime::at(0, 23).plus_minutes(59).plus_seconds(58));
        assert_eq!(clock.tick().new_day, None);
        let crossing = clock.tick();
        assert_eq!(crossing.new_day, Some(1));
        assert_eq!(crossing.now, SimTime::at(1, 0));
        assert_eq!(clock.tick().new_day, None);
    }

    #[test]
    fn test_restore_drops_accumulator() {
        let mut clock = SimClock::default();
        assert_eq!(clock.advance(1.0 / 128.0), 0);
        clock.restore(SimTime::at(3, 10), 2.0);
        assert_eq!(clock.now(), SimTime::at(3, 10));
        assert_eq!(clock.multiplier(), 2.0);
        assert_eq!(clock.advance(1.0 / 128.0), 0);
    }
}
