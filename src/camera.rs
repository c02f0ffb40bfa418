//! Game camera
//!
//! One camera per scene, owned by the context. World positions map to the
//! 320x240 logical canvas through it; results are rounded to whole pixels
//! so sprites stay crisp at integer scale factors.
//!
//! Shake is an additive offset rerolled on a short cadence while a shake is
//! active, cleared when it expires.

use macroquad::math::{vec2, Vec2};
use rand::rngs::SmallRng;
use rand::Rng;

use crate::ctx::stream_rng;

pub const VIEW_WIDTH: f32 = 320.0;
pub const VIEW_HEIGHT: f32 = 240.0;

const SHAKE_REROLL: f32 = 0.05;

pub struct Camera {
    /// Top-left corner of the view, in world pixels.
    pub position: Vec2,
    /// Shake displacement, zero when idle.
    pub offset: Vec2,
    pub width: f32,
    pub height: f32,
    shake_magnitude: Vec2,
    shake_remaining: f32,
    shake_cadence: f32,
    rng: SmallRng,
}

impl Camera {
    pub fn new() -> Self {
        Self {
            position: Vec2::ZERO,
            offset: Vec2::ZERO,
            width: VIEW_WIDTH,
            height: VIEW_HEIGHT,
            shake_magnitude: Vec2::ZERO,
            shake_remaining: 0.0,
            shake_cadence: 0.0,
            rng: stream_rng(),
        }
    }

    pub fn center(&self) -> Vec2 {
        self.position + vec2(self.width, self.height) / 2.0
    }

    /// Map a world position to canvas pixels, rounded.
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        (world - self.position + self.offset).round()
    }

    /// Visible world bounds, for draw culling. Padded by one cell so
    /// partially visible blocks still draw.
    pub fn visible(&self, pad: f32) -> (Vec2, Vec2) {
        (
            self.position - vec2(pad, pad),
            self.position + vec2(self.width + pad, self.height + pad),
        )
    }

    /// Ease the view toward centering on `target`. `rate` is the fraction
    /// of the remaining distance covered per call.
    pub fn follow(&mut self, target: Vec2, rate: f32) {
        let desired = target - vec2(self.width, self.height) / 2.0;
        self.position += (desired - self.position) * rate;
    }

    pub fn snap_to(&mut self, target: Vec2) {
        self.position = target - vec2(self.width, self.height) / 2.0;
    }

    pub fn shake(&mut self, magnitude: Vec2, duration: f32) {
        self.shake_magnitude = magnitude;
        self.shake_remaining = duration;
        self.shake_cadence = 0.0;
    }

    pub fn update(&mut self, dt: f32) {
        if self.shake_remaining <= 0.0 {
            return;
        }
        self.shake_remaining -= dt;
        self.shake_cadence -= dt;
        if self.shake_remaining <= 0.0 {
            self.offset = Vec2::ZERO;
            return;
        }
        if self.shake_cadence <= 0.0 {
            self.shake_cadence = SHAKE_REROLL;
            let m = self.shake_magnitude;
            self.offset = vec2(
                if m.x > 0.0 { self.rng.gen_range(-m.x..=m.x) } else { 0.0 },
                if m.y > 0.0 { self.rng.gen_range(-m.y..=m.y) } else { 0.0 },
            );
        }
    }

    pub fn reset(&mut self) {
        self.position = Vec2::ZERO;
        self.offset = Vec2::ZERO;
        self.shake_magnitude = Vec2::ZERO;
        self.shake_remaining = 0.0;
        self.shake_cadence = 0.0;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_to_screen_rounds_to_whole_pixels() {
        let mut camera = Camera::new();
        camera.position = vec2(10.4, 20.6);
        let screen = camera.world_to_screen(vec2(100.0, 100.0));
        assert_eq!(screen, vec2(90.0, 79.0));
        assert_eq!(screen.x.fract(), 0.0);
        assert_eq!(screen.y.fract(), 0.0);
    }

    #[test]
    fn shake_offsets_stay_in_bounds_and_clear_on_expiry() {
        let mut camera = Camera::new();
        camera.shake(vec2(3.0, 2.0), 0.2);

        let mut saw_offset = false;
        for _ in 0..10 {
            camera.update(0.016);
            assert!(camera.offset.x.abs() <= 3.0);
            assert!(camera.offset.y.abs() <= 2.0);
            if camera.offset != Vec2::ZERO {
                saw_offset = true;
            }
        }
        assert!(saw_offset);

        camera.update(1.0);
        assert_eq!(camera.offset, Vec2::ZERO);
    }

    #[test]
    fn follow_converges_on_target() {
        let mut camera = Camera::new();
        let target = vec2(500.0, 400.0);
        for _ in 0..200 {
            camera.follow(target, 0.1);
        }
        let center = camera.center();
        assert!((center.x - target.x).abs() < 0.5);
        assert!((center.y - target.y).abs() < 0.5);
    }
}
