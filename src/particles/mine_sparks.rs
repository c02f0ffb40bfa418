//! Mining sparks
//!
//! A small burst of pixel sparks off the block face on every mining tick.
//! Sparks fall under gravity, slow with friction, and bounce off the block
//! boxes captured at spawn time.

use macroquad::color::WHITE;
use macroquad::math::{vec2, Vec2};
use macroquad::shapes::draw_rectangle;
use rand::rngs::SmallRng;
use rand::Rng;

use crate::camera::Camera;
use crate::physics::{resolve_aabb, Aabb, Side};

use super::{emitter_rng, Emitter, Particle, BOUNCE_RESTITUTION};

const COUNT_MIN: u32 = 3;
const COUNT_MAX: u32 = 5;
const LIFE: f32 = 1.0;
const LIFE_VARIANCE: f32 = 0.3;
const SPEED: f32 = 30.0;
const SPEED_VARIANCE: f32 = 100.0;
const GRAVITY: f32 = 1000.0;
const FRICTION: f32 = 0.98;

pub struct MineSparkEmitter {
    particles: Vec<Particle>,
    boxes: Vec<Aabb>,
}

impl MineSparkEmitter {
    /// `boxes` are nearby solid blocks for bounces. Speed and count
    /// multipliers let harder blocks spark more violently.
    pub fn new(origin: Vec2, boxes: Vec<Aabb>, speed_scale: f32, count_scale: f32) -> Self {
        let mut rng = emitter_rng();
        let count = (rng.gen_range(COUNT_MIN..=COUNT_MAX) as f32 * count_scale).round() as u32;
        let particles = (0..count.max(1))
            .map(|_| spawn_spark(&mut rng, origin, speed_scale))
            .collect();
        Self { particles, boxes }
    }
}

fn spawn_spark(rng: &mut SmallRng, origin: Vec2, speed_scale: f32) -> Particle {
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    let speed = (SPEED + rng.gen_range(-SPEED_VARIANCE..SPEED_VARIANCE)) * speed_scale;
    Particle {
        position: origin,
        velocity: vec2(angle.cos(), angle.sin()) * speed,
        life: LIFE + rng.gen_range(-LIFE_VARIANCE..LIFE_VARIANCE),
        radius: 1.0,
        gravity: GRAVITY,
    }
}

impl Emitter for MineSparkEmitter {
    fn update(&mut self, dt: f32) {
        for p in &mut self.particles {
            if !p.is_alive() {
                continue;
            }
            p.life -= dt;
            p.velocity.y += p.gravity * dt;
            p.velocity *= FRICTION;
            p.position += p.velocity * dt;

            let bounds = Aabb::new(p.position.x, p.position.y, p.radius, p.radius);
            for block in &self.boxes {
                if !bounds.overlaps(block) {
                    continue;
                }
                let r = resolve_aabb(bounds, p.velocity.x, p.velocity.y, *block);
                p.position = vec2(r.x, r.y);
                match r.side {
                    Side::Top | Side::Bottom => p.velocity.y *= BOUNCE_RESTITUTION,
                    Side::Left | Side::Right => p.velocity.x *= BOUNCE_RESTITUTION,
                }
            }
        }
    }

    fn draw(&self, camera: &Camera) {
        for p in self.particles.iter().filter(|p| p.is_alive()) {
            let screen = camera.world_to_screen(p.position);
            draw_rectangle(screen.x, screen.y, p.radius, p.radius, WHITE);
        }
    }

    fn is_finished(&self) -> bool {
        self.particles.iter().all(|p| !p.is_alive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_spawns_within_count_bounds() {
        let emitter = MineSparkEmitter::new(vec2(0.0, 0.0), vec![], 1.0, 1.0);
        let n = emitter.particles.len() as u32;
        assert!((COUNT_MIN..=COUNT_MAX).contains(&n));
        assert!(!emitter.is_finished());
    }

    #[test]
    fn sparks_expire_within_their_lifetime() {
        let mut emitter = MineSparkEmitter::new(vec2(0.0, 0.0), vec![], 1.0, 1.0);
        for _ in 0..((LIFE + LIFE_VARIANCE) / (1.0 / 60.0)) as u32 + 2 {
            emitter.update(1.0 / 60.0);
        }
        assert!(emitter.is_finished());
    }

    #[test]
    fn sparks_bounce_off_a_floor() {
        let floor = Aabb::new(-500.0, 50.0, 1000.0, 32.0);
        let mut emitter = MineSparkEmitter::new(vec2(0.0, 0.0), vec![floor], 1.0, 1.0);
        for _ in 0..120 {
            emitter.update(1.0 / 60.0);
            for p in emitter.particles.iter().filter(|p| p.is_alive()) {
                // Never resting inside the floor
                assert!(p.position.y <= 50.0 + 0.5, "spark sank into the floor");
            }
        }
    }
}
