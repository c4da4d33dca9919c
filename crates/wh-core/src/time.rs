//! Simulation time model.
//!
//! # Design
//!
//! Time is represented as a monotonically increasing `Tick` counter.  The
//! mapping to simulated seconds is held in `SimClock`:
//!
//!   now = tick * step_secs
//!
//! Deriving `now` from the integer tick (rather than summing `step_secs`
//! every tick) keeps long runs free of accumulated floating-point drift, so
//! two runs with the same step always observe bit-identical timestamps.

use std::fmt;

use crate::{WhError, WhResult};

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation tick counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }

    /// Ticks elapsed from `earlier` to `self`.
    #[inline]
    pub fn since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Fixed-step simulation clock with a configured horizon.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// Simulated seconds per tick.
    pub step_secs: f64,
    /// Total simulated seconds to run.
    pub horizon_secs: f64,
    /// The current tick, advanced by `SimClock::advance()` each step.
    pub current_tick: Tick,
    /// First tick whose time is at or past the horizon.
    pub end_tick: Tick,
}

impl SimClock {
    /// Build a clock, rejecting a non-positive or non-finite step or horizon.
    pub fn new(step_secs: f64, horizon_secs: f64) -> WhResult<Self> {
        if !(step_secs.is_finite() && step_secs > 0.0) {
            return Err(WhError::Config(format!(
                "time step must be positive and finite, got {step_secs}"
            )));
        }
        if !(horizon_secs.is_finite() && horizon_secs > 0.0) {
            return Err(WhError::Config(format!(
                "horizon must be positive and finite, got {horizon_secs}"
            )));
        }
        // Tolerate representation error so 1.0 / 0.1 counts as 10 steps.
        let end = (horizon_secs / step_secs - 1e-9).ceil().max(1.0) as u64;
        Ok(Self {
            step_secs,
            horizon_secs,
            current_tick: Tick::ZERO,
            end_tick:     Tick(end),
        })
    }

    /// Current simulated time in seconds.
    #[inline]
    pub fn now(&self) -> f64 {
        self.time_at(self.current_tick)
    }

    #[inline]
    pub fn time_at(&self, tick: Tick) -> f64 {
        tick.0 as f64 * self.step_secs
    }

    /// Advance the clock by one step.
    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = Tick(self.current_tick.0 + 1);
    }

    /// `true` once the current time has reached the horizon.
    #[inline]
    pub fn at_horizon(&self) -> bool {
        self.current_tick >= self.end_tick
    }

    /// Steps left before the horizon.
    #[inline]
    pub fn remaining_steps(&self) -> u64 {
        self.end_tick.since(self.current_tick)
    }

    /// Rewind to tick zero, keeping step and horizon.
    pub fn reset(&mut self) {
        self.current_tick = Tick::ZERO;
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (t={:.2}s / {:.2}s)", self.current_tick, self.now(), self.horizon_secs)
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level simulation configuration.
///
/// Typically loaded from a JSON file by the application crate and passed to
/// the stepper builder.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Seconds per step.  Default: 0.1.
    pub time_step: f64,

    /// Simulated seconds to run.  Default: 3600.
    pub duration: f64,

    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,

    /// Emit a progress log line every N steps.  0 disables progress logs.
    pub progress_interval_steps: u64,

    /// Emit collision events when bot discs start to overlap.
    pub detect_collisions: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            time_step:               0.1,
            duration:                3600.0,
            seed:                    42,
            progress_interval_steps: 1000,
            detect_collisions:       true,
        }
    }
}

impl SimConfig {
    /// Eagerly reject values that would make the clock meaningless.
    pub fn validate(&self) -> WhResult<()> {
        self.make_clock().map(|_| ())
    }

    /// Construct a `SimClock` pre-configured for this run.
    pub fn make_clock(&self) -> WhResult<SimClock> {
        SimClock::new(self.time_step, self.duration)
    }
}
