//! Simulation Clock and Tick Countdowns
//!
//! Every timer in the simulation is a whole number of ticks.
//! Nothing is scheduled, nothing runs concurrently: a countdown
//! only moves when its owner advances it during a tick.

use serde::{Serialize, Deserialize};

/// Fixed-timestep simulation clock.
///
/// Time is derived from the tick counter instead of being accumulated,
/// so `now()` never drifts from `tick * dt`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimClock {
    /// Ticks elapsed since the clock started
    pub tick: u32,
    /// Seconds per tick
    pub dt: f32,
}

impl SimClock {
    /// Create a clock running at `tick_rate` Hz.
    pub fn new(tick_rate: u32) -> Self {
        Self {
            tick: 0,
            dt: 1.0 / tick_rate.max(1) as f32,
        }
    }

    /// Current simulation time in seconds.
    #[inline]
    pub fn now(&self) -> f32 {
        self.tick as f32 * self.dt
    }

    /// Advance one tick.
    #[inline]
    pub fn advance(&mut self) {
        self.tick += 1;
    }

    /// Convert a duration in seconds to a tick count (rounded up, at least one tick).
    pub fn ticks_for(&self, secs: f32) -> u32 {
        secs_to_ticks(secs, self.dt)
    }
}

/// Convert seconds to whole ticks, rounding up.
///
/// A positive duration always lasts at least one tick; zero or negative
/// durations map to zero. A small epsilon absorbs float noise so that
/// exactly `n * dt` does not round up to `n + 1`.
pub fn secs_to_ticks(secs: f32, dt: f32) -> u32 {
    if secs <= 0.0 || dt <= 0.0 {
        return 0;
    }
    let ticks = (secs / dt - 1e-3).ceil();
    ticks.max(1.0) as u32
}

/// A tick-counted countdown.
///
/// `Countdown::default()` is stopped. `advance()` returns `true` exactly
/// once: on the tick the countdown reaches zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    remaining: u32,
}

impl Countdown {
    /// A stopped countdown.
    pub const STOPPED: Self = Self { remaining: 0 };

    /// Start a countdown of `ticks` ticks.
    #[inline]
    pub const fn ticks(ticks: u32) -> Self {
        Self { remaining: ticks }
    }

    /// Start a countdown lasting `secs` at timestep `dt`.
    pub fn from_secs(secs: f32, dt: f32) -> Self {
        Self::ticks(secs_to_ticks(secs, dt))
    }

    /// Is the countdown still running?
    #[inline]
    pub fn is_running(&self) -> bool {
        self.remaining > 0
    }

    /// Ticks left before it fires.
    #[inline]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Stop without firing.
    #[inline]
    pub fn stop(&mut self) {
        self.remaining = 0;
    }

    /// Advance one tick. Returns `true` on the tick the countdown fires.
    #[inline]
    pub fn advance(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.remaining == 0
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_now_is_derived_from_ticks() {
        let mut clock = SimClock::new(60);
        for _ in 0..600 {
            clock.advance();
        }
        assert_eq!(clock.tick, 600);
        assert!((clock.now() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_secs_to_ticks_rounding() {
        let dt = 1.0 / 60.0;
        assert_eq!(secs_to_ticks(1.0, dt), 60);
        assert_eq!(secs_to_ticks(0.2, dt), 12);
        // 20ms is 1.2 ticks at 60Hz -> 2
        assert_eq!(secs_to_ticks(0.02, dt), 2);
        // Tiny durations still last a tick
        assert_eq!(secs_to_ticks(0.0001, dt), 1);
        assert_eq!(secs_to_ticks(0.0, dt), 0);
        assert_eq!(secs_to_ticks(-1.0, dt), 0);
    }

    #[test]
    fn test_countdown_fires_once() {
        let mut countdown = Countdown::ticks(3);
        assert!(countdown.is_running());
        assert!(!countdown.advance());
        assert!(!countdown.advance());
        assert!(countdown.advance());
        assert!(!countdown.is_running());
        // Stays stopped
        assert!(!countdown.advance());
    }

    #[test]
    fn test_countdown_stop_never_fires() {
        let mut countdown = Countdown::ticks(2);
        countdown.stop();
        assert!(!countdown.advance());
        assert!(!countdown.advance());
        assert_eq!(Countdown::default(), Countdown::STOPPED);
    }
}
