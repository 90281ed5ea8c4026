//! Fixed-timestep clock for the browser render loop.
//!
//! `draw_web()` fires at the display rate with a variable delta. FrameClock
//! turns those timestamps into whole game ticks so countdowns and feedback
//! delays are deterministic and testable.

/// Game ticks per real-time second.
pub const TICKS_PER_SEC: u32 = 10;
pub const MS_PER_TICK: f64 = 1000.0 / TICKS_PER_SEC as f64;

/// Longest frame gap credited to the game. A backgrounded tab resumes
/// roughly where it paused instead of burning through the countdown.
pub const MAX_FRAME_GAP_MS: f64 = 500.0;

#[derive(Debug, Default)]
pub struct FrameClock {
    carry_ms: f64,
    last_frame_ms: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a `performance.now()` timestamp; returns the ticks to run.
    pub fn advance(&mut self, now_ms: f64) -> u32 {
        let delta = match self.last_frame_ms {
            Some(prev) => (now_ms - prev).clamp(0.0, MAX_FRAME_GAP_MS),
            None => 0.0,
        };
        self.last_frame_ms = Some(now_ms);

        self.carry_ms += delta;
        let ticks = (self.carry_ms / MS_PER_TICK) as u32;
        self.carry_ms -= ticks as f64 * MS_PER_TICK;
        ticks
    }
}

/// Convert whole seconds to ticks.
pub const fn secs_to_ticks(secs: u32) -> u32 {
    secs * TICKS_PER_SEC
}

/// Convert milliseconds to ticks, rounding up so short delays still last a tick.
pub const fn ms_to_ticks(ms: u32) -> u32 {
    ms.div_ceil(1000 / TICKS_PER_SEC)
}
