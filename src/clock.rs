//! Frame clock
//!
//! Clamps the wall delta (tab switches and debugger pauses produce huge
//! deltas that would tunnel entities through blocks), then subdivides it
//! into equal sub-steps no longer than `FIXED_STEP`. The sub-steps cover
//! the clamped delta exactly, so total simulated time does not depend on
//! how the frames happened to be sliced.
//!
//! Draw code gets a smoothed delta (rolling average over recent frames) so
//! purely cosmetic motion does not stutter with scheduler noise.

use std::collections::VecDeque;

pub const FIXED_STEP: f32 = 1.0 / 60.0;
pub const MAX_FRAME_DELTA: f32 = 0.1;

const SMOOTHING_WINDOW: usize = 30;

/// One frame's worth of simulation work.
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    /// Number of simulation sub-steps to run.
    pub steps: u32,
    /// Duration of each sub-step, `<= FIXED_STEP`.
    pub step_dt: f32,
    /// The clamped frame delta (`steps * step_dt`).
    pub delta: f32,
    /// Rolling average delta for draw-side interpolation.
    pub smoothed: f32,
}

pub struct FrameClock {
    recent: VecDeque<f32>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self { recent: VecDeque::with_capacity(SMOOTHING_WINDOW) }
    }

    pub fn tick(&mut self, raw_delta: f32) -> Frame {
        let delta = raw_delta.clamp(0.0, MAX_FRAME_DELTA);

        if self.recent.len() == SMOOTHING_WINDOW {
            self.recent.pop_front();
        }
        self.recent.push_back(delta);
        let smoothed = self.recent.iter().sum::<f32>() / self.recent.len() as f32;

        let steps = (delta / FIXED_STEP).ceil().max(1.0) as u32;
        Frame { steps, step_dt: delta / steps as f32, delta, smoothed }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
