//! Entity contract
//!
//! The closed set of scene-owned objects that tick and draw every frame.
//! Blocks are driven in bulk by the world and the player needs the world to
//! resolve against, so both have their own entry points; everything else
//! (lantern, log, menu widgets) goes through this trait.

use std::rc::Rc;

use macroquad::math::Vec2;

use crate::camera::Camera;
use crate::ctx::Ctx;

pub trait Entity {
    fn update(&mut self, ctx: &Rc<Ctx>, dt: f32);
    fn draw(&mut self, ctx: &Ctx, dt: f32);
}

/// Canvas position of a world point, rounded to whole pixels.
pub fn screen_position(world: Vec2, camera: &Camera) -> Vec2 {
    camera.world_to_screen(world)
}
