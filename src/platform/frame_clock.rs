//=========================================================================
// Frame Clock
//=========================================================================
//
// Measures the time between frames for `GameCoordinator::frame`.
//
// Delta time is clamped: a debugger pause or a minimized window must not
// hand the update pipeline a multi-second step, and a tight loop must not
// hand it zero.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::time::{Duration, Instant};

//=== FrameClock ==========================================================

#[derive(Debug, Clone)]
pub(crate) struct FrameClock {
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    /// Clock with a 100µs..250ms delta clamp.
    pub(crate) fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    pub(crate) fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Restarts timing from now, e.g. after the window resumes.
    pub(crate) fn reset(&mut self) {
        self.last = Instant::now();
    }

    /// Time since the previous tick, clamped.
    pub(crate) fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);
        self.last = now;
        self.frame_index = self.frame_index.wrapping_add(1);
        dt
    }

    /// Ticks taken so far.
    pub(crate) fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Instant of the last tick.
    pub(crate) fn last_tick(&self) -> Instant {
        self.last
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
