//! Particle engine
//!
//! Emitters own their particle pools; a manager owns the emitters and walks
//! them every frame, dropping any emitter that reports itself finished.
//! Particles are simulated in world space and collide against block boxes
//! snapshotted when the emitter spawns.

mod destroy_burst;
mod fall_dust;
mod mine_sparks;

pub use destroy_burst::DestroyBurstEmitter;
pub use fall_dust::FallDustEmitter;
pub use mine_sparks::MineSparkEmitter;

use macroquad::math::Vec2;
use rand::rngs::SmallRng;

use crate::camera::Camera;
use crate::ctx::stream_rng;

/// Velocity flip factor on particle bounce.
pub(crate) const BOUNCE_RESTITUTION: f32 = -0.3;

#[derive(Debug, Clone, Copy)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Seconds remaining; dead at or below zero.
    pub life: f32,
    pub radius: f32,
    pub gravity: f32,
}

impl Particle {
    pub fn is_alive(&self) -> bool {
        self.life > 0.0
    }
}

/// One burst or stream of particles with its own motion rules.
pub trait Emitter {
    fn update(&mut self, dt: f32);
    fn draw(&self, camera: &Camera);
    /// True once every particle is spent and no more will spawn.
    fn is_finished(&self) -> bool;
}

pub struct Particles {
    emitters: Vec<Box<dyn Emitter>>,
}

impl Particles {
    pub fn new() -> Self {
        Self { emitters: Vec::new() }
    }

    pub fn add(&mut self, emitter: Box<dyn Emitter>) {
        self.emitters.push(emitter);
    }

    pub fn update(&mut self, dt: f32) {
        for emitter in &mut self.emitters {
            emitter.update(dt);
        }
        self.emitters.retain(|e| !e.is_finished());
    }

    pub fn draw(&self, camera: &Camera) {
        for emitter in &self.emitters {
            emitter.draw(camera);
        }
    }

    pub fn count(&self) -> usize {
        self.emitters.len()
    }

    pub fn reset(&mut self) {
        self.emitters.clear();
    }
}

impl Default for Particles {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-emitter rng. Wall-time seeded with a per-call stream, so two bursts
/// in the same frame do not mirror each other.
pub(crate) fn emitter_rng() -> SmallRng {
    stream_rng()
}

#[cfg(test)]
mod tests {
    use super::*;
    use macroquad::math::vec2;

    struct CountdownEmitter {
        remaining: f32,
    }

    impl Emitter for CountdownEmitter {
        fn update(&mut self, dt: f32) {
            self.remaining -= dt;
        }
        fn draw(&self, _camera: &Camera) {}
        fn is_finished(&self) -> bool {
            self.remaining <= 0.0
        }
    }

    #[test]
    fn finished_emitters_are_dropped() {
        let mut particles = Particles::new();
        particles.add(Box::new(CountdownEmitter { remaining: 0.05 }));
        particles.add(Box::new(CountdownEmitter { remaining: 1.0 }));
        assert_eq!(particles.count(), 2);

        particles.update(0.1);
        assert_eq!(particles.count(), 1);

        particles.update(1.0);
        assert_eq!(particles.count(), 0);
    }

    #[test]
    fn reset_drops_everything() {
        let mut particles = Particles::new();
        particles.add(Box::new(CountdownEmitter { remaining: 10.0 }));
        particles.reset();
        assert_eq!(particles.count(), 0);
    }

    #[test]
    fn spark_burst_runs_to_completion() {
        let mut particles = Particles::new();
        particles.add(Box::new(MineSparkEmitter::new(
            vec2(50.0, 50.0),
            vec![],
            1.0,
            1.0,
        )));
        for _ in 0..240 {
            particles.update(1.0 / 60.0);
        }
        // Sparks live at most 1.3s
        assert_eq!(particles.count(), 0);
    }
}
