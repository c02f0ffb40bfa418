//! Debug overlay drawing
//!
//! Collision boxes, probes, and markers. Everything goes through the debug
//! layer of the draw queue, so these calls are safe from anywhere in the
//! update or draw path and cost nothing when the overlay is off.

use macroquad::color::Color;
use macroquad::shapes::draw_rectangle_lines;

use crate::ctx::Ctx;
use crate::physics::Aabb;
use crate::render::queue::DrawLayer;

#[derive(Debug, Clone, Copy)]
pub enum DebugColor {
    Red,
    Green,
    Blue,
    Yellow,
}

impl DebugColor {
    fn color(self) -> Color {
        match self {
            DebugColor::Red => Color::from_rgba(255, 80, 80, 255),
            DebugColor::Green => Color::from_rgba(80, 255, 120, 255),
            DebugColor::Blue => Color::from_rgba(90, 140, 255, 255),
            DebugColor::Yellow => Color::from_rgba(255, 220, 80, 255),
        }
    }
}

/// Outline a world-space box on the debug layer.
pub fn debug_rect(ctx: &Ctx, bounds: Aabb, color: DebugColor) {
    if !ctx.debug_draw.get() {
        return;
    }
    let screen = ctx
        .camera
        .borrow()
        .world_to_screen(macroquad::math::vec2(bounds.x, bounds.y));
    let (w, h) = (bounds.w, bounds.h);
    ctx.draws.defer(DrawLayer::Debug, move || {
        draw_rectangle_lines(screen.x, screen.y, w, h, 1.0, color.color());
    });
}
