//! Falling-block dust
//!
//! A dust column trailing a falling block. While the shared `active` flag
//! is set, motes spawn on a fixed cadence across the block's width and
//! drift down with a sinusoidal sway. When the block lands the scene clears
//! the flag: spawning stops and any mote that touches the source box is
//! snuffed out instead of clipping through the landed block.

use std::cell::Cell;
use std::rc::Rc;

use macroquad::color::Color;
use macroquad::math::vec2;
use macroquad::shapes::draw_rectangle;
use rand::rngs::SmallRng;
use rand::Rng;

use crate::camera::Camera;
use crate::physics::Aabb;

use super::{emitter_rng, Emitter, Particle};

const SPAWN_INTERVAL: f32 = 0.1;
const LIFE: f32 = 2.0;
const GRAVITY: f32 = 50.0;
const GRAVITY_JITTER_MIN: f32 = 0.5;
const GRAVITY_JITTER_MAX: f32 = 1.3;
const SWAY_STRENGTH: f32 = 30.0;

const DUST_COLOR: Color = Color::new(0.75, 0.7, 0.6, 0.8);

pub struct FallDustEmitter {
    particles: Vec<Particle>,
    /// Box of the block when it started falling; motes are clamped to its
    /// horizontal span.
    source: Aabb,
    active: Rc<Cell<bool>>,
    spawn_elapsed: f32,
    rng: SmallRng,
}

impl FallDustEmitter {
    pub fn new(source: Aabb, active: Rc<Cell<bool>>) -> Self {
        Self {
            particles: Vec::new(),
            source,
            active,
            spawn_elapsed: SPAWN_INTERVAL,
            rng: emitter_rng(),
        }
    }

    fn spawn(&mut self) {
        let x = self.rng.gen_range(self.source.x..self.source.right());
        let gravity = GRAVITY * self.rng.gen_range(GRAVITY_JITTER_MIN..GRAVITY_JITTER_MAX);
        self.particles.push(Particle {
            position: vec2(x, self.source.y - 2.0),
            velocity: vec2(0.0, 0.0),
            life: LIFE,
            radius: 1.0,
            gravity,
        });
    }
}

impl Emitter for FallDustEmitter {
    fn update(&mut self, dt: f32) {
        if self.active.get() {
            self.spawn_elapsed += dt;
            while self.spawn_elapsed >= SPAWN_INTERVAL {
                self.spawn_elapsed -= SPAWN_INTERVAL;
                self.spawn();
            }
        }

        let stopped = !self.active.get();
        for p in &mut self.particles {
            if !p.is_alive() {
                continue;
            }
            p.life -= dt;
            p.velocity.y += p.gravity * dt;
            // Sideways sway, phase-shifted by height so the column shimmers
            p.velocity.x += ((p.life * 10.0) + p.position.y * 0.01).sin() * SWAY_STRENGTH * dt;
            p.position += p.velocity * dt;

            // Keep the column over the block
            p.position.x = p.position.x.clamp(self.source.x, self.source.right() - p.radius);

            if stopped {
                let bounds = Aabb::new(p.position.x, p.position.y, p.radius, p.radius);
                if bounds.overlaps(&self.source) {
                    p.life = 0.0;
                }
            }
        }
    }

    fn draw(&self, camera: &Camera) {
        for p in self.particles.iter().filter(|p| p.is_alive()) {
            let screen = camera.world_to_screen(p.position);
            draw_rectangle(screen.x, screen.y, p.radius, p.radius, DUST_COLOR);
        }
    }

    fn is_finished(&self) -> bool {
        !self.active.get() && self.particles.iter().all(|p| !p.is_alive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn falling_box() -> Aabb {
        Aabb::new(64.0, 32.0, 32.0, 32.0)
    }

    #[test]
    fn spawns_on_cadence_while_active() {
        let active = Rc::new(Cell::new(true));
        let mut emitter = FallDustEmitter::new(falling_box(), Rc::clone(&active));

        emitter.update(0.25);
        let after_quarter = emitter.particles.len();
        assert!(after_quarter >= 2, "expected motes after 0.25s, got {after_quarter}");

        emitter.update(0.25);
        assert!(emitter.particles.len() > after_quarter);
        assert!(!emitter.is_finished());
    }

    #[test]
    fn motes_stay_within_the_column() {
        let active = Rc::new(Cell::new(true));
        let mut emitter = FallDustEmitter::new(falling_box(), Rc::clone(&active));
        for _ in 0..120 {
            emitter.update(1.0 / 60.0);
        }
        for p in emitter.particles.iter().filter(|p| p.is_alive()) {
            assert!(p.position.x >= 64.0);
            assert!(p.position.x <= 96.0);
        }
    }

    #[test]
    fn stopping_halts_spawning_and_drains() {
        let active = Rc::new(Cell::new(true));
        let mut emitter = FallDustEmitter::new(falling_box(), Rc::clone(&active));
        emitter.update(0.3);

        active.set(false);
        let count = emitter.particles.len();
        emitter.update(0.3);
        assert_eq!(emitter.particles.len(), count);

        // All motes die out within their lifetime
        for _ in 0..((LIFE / (1.0 / 60.0)) as u32 + 2) {
            emitter.update(1.0 / 60.0);
        }
        assert!(emitter.is_finished());
    }

    #[test]
    fn source_contact_kills_motes_after_stop() {
        let active = Rc::new(Cell::new(true));
        let source = falling_box();
        let mut emitter = FallDustEmitter::new(source, Rc::clone(&active));
        emitter.update(0.2);
        active.set(false);

        // Freshly spawned motes start on the source box edge
        emitter.update(1.0 / 60.0);
        for p in emitter.particles.iter().filter(|p| p.is_alive()) {
            let bounds = Aabb::new(p.position.x, p.position.y, p.radius, p.radius);
            assert!(!bounds.overlaps(&source));
        }
    }
}
