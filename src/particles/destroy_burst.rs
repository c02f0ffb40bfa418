//! Block destruction debris
//!
//! Chunky rubble thrown from a destroyed block's bounds. Debris bounces off
//! surrounding blocks, settles under friction, and is force-killed by the
//! death box of any block that was falling when the burst spawned.

use macroquad::color::WHITE;
use macroquad::math::vec2;
use macroquad::shapes::draw_circle;
use rand::rngs::SmallRng;
use rand::Rng;

use crate::camera::Camera;
use crate::physics::{resolve_aabb, Aabb, Side};

use super::{emitter_rng, Emitter, Particle, BOUNCE_RESTITUTION};

const COUNT_MIN: u32 = 4;
const COUNT_MAX: u32 = 5;
const LIFE: f32 = 3.0;
const LIFE_VARIANCE: f32 = 0.5;
const SPEED: f32 = 20.0;
const SPEED_VARIANCE: f32 = 50.0;
const GRAVITY: f32 = 1000.0;
const FRICTION: f32 = 0.97;

// Radius 3 debris is twice as common as 2 or 4
const RADIUS_WEIGHTS: [(f32, u32); 3] = [(2.0, 1), (3.0, 2), (4.0, 1)];

pub struct DestroyBurstEmitter {
    particles: Vec<Particle>,
    boxes: Vec<Aabb>,
    death_boxes: Vec<Aabb>,
}

impl DestroyBurstEmitter {
    /// `boxes` and `death_boxes` are snapshots taken when the block is
    /// destroyed; debris collides against where things were at that moment.
    pub fn new(source: Aabb, boxes: Vec<Aabb>, death_boxes: Vec<Aabb>) -> Self {
        let mut rng = emitter_rng();
        let count = rng.gen_range(COUNT_MIN..=COUNT_MAX);
        let particles = (0..count)
            .map(|_| spawn_debris(&mut rng, source))
            .collect();
        Self { particles, boxes, death_boxes }
    }
}

fn weighted_radius(rng: &mut SmallRng) -> f32 {
    let total: u32 = RADIUS_WEIGHTS.iter().map(|(_, w)| w).sum();
    let mut roll = rng.gen_range(0..total);
    for (radius, weight) in RADIUS_WEIGHTS {
        if roll < weight {
            return radius;
        }
        roll -= weight;
    }
    RADIUS_WEIGHTS[0].0
}

fn spawn_debris(rng: &mut SmallRng, source: Aabb) -> Particle {
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    let speed = SPEED + rng.gen_range(-SPEED_VARIANCE..SPEED_VARIANCE);
    Particle {
        position: vec2(
            rng.gen_range(source.x..source.right()),
            rng.gen_range(source.y..source.bottom()),
        ),
        velocity: vec2(angle.cos(), angle.sin()) * speed,
        life: LIFE + rng.gen_range(-LIFE_VARIANCE..LIFE_VARIANCE),
        radius: weighted_radius(rng),
        gravity: GRAVITY,
    }
}

impl Emitter for DestroyBurstEmitter {
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

            // Crushed by a landing block
            if self.death_boxes.iter().any(|d| bounds.overlaps(d)) {
                p.life = 0.0;
                continue;
            }

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
            draw_circle(screen.x, screen.y, p.radius / 2.0, WHITE);
        }
    }

    fn is_finished(&self) -> bool {
        self.particles.iter().all(|p| !p.is_alive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> Aabb {
        Aabb::new(32.0, 32.0, 32.0, 32.0)
    }

    #[test]
    fn debris_spawns_inside_the_source_box() {
        let emitter = DestroyBurstEmitter::new(source(), vec![], vec![]);
        for p in &emitter.particles {
            assert!(p.position.x >= 32.0 && p.position.x < 64.0);
            assert!(p.position.y >= 32.0 && p.position.y < 64.0);
        }
    }

    #[test]
    fn radii_come_from_the_weighted_table() {
        let emitter = DestroyBurstEmitter::new(source(), vec![], vec![]);
        for p in &emitter.particles {
            assert!([2.0, 3.0, 4.0].contains(&p.radius));
        }
    }

    #[test]
    fn death_box_contact_kills_debris_immediately() {
        // A death box covering everything the debris could reach
        let everywhere = Aabb::new(-1000.0, -1000.0, 2000.0, 2000.0);
        let mut emitter = DestroyBurstEmitter::new(source(), vec![], vec![everywhere]);
        emitter.update(1.0 / 60.0);
        assert!(emitter.is_finished());
    }

    #[test]
    fn debris_expires_on_its_own() {
        let mut emitter = DestroyBurstEmitter::new(source(), vec![], vec![]);
        for _ in 0..((LIFE + LIFE_VARIANCE) / (1.0 / 60.0)) as u32 + 2 {
            emitter.update(1.0 / 60.0);
        }
        assert!(emitter.is_finished());
    }
}
