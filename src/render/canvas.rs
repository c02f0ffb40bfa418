//! Logical canvas
//!
//! All game drawing targets a fixed 320x240 render target, which is then
//! blitted to the window at the largest integer scale that fits, centered
//! with black bars. Nearest filtering everywhere keeps pixels square.

use macroquad::camera::{set_camera, set_default_camera, Camera2D};
use macroquad::color::{BLACK, WHITE};
use macroquad::math::{vec2, Rect};
use macroquad::texture::{draw_texture_ex, render_target, DrawTextureParams, FilterMode, RenderTarget};
use macroquad::window::{clear_background, screen_height, screen_width};

pub struct Canvas {
    target: RenderTarget,
    pub width: f32,
    pub height: f32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        let target = render_target(width, height);
        target.texture.set_filter(FilterMode::Nearest);
        Self { target, width: width as f32, height: height as f32 }
    }

    /// Redirect drawing into the logical canvas.
    pub fn begin(&self) {
        let mut camera = Camera2D::from_display_rect(Rect::new(0.0, 0.0, self.width, self.height));
        camera.render_target = Some(self.target.clone());
        set_camera(&camera);
        clear_background(BLACK);
    }

    /// Blit the canvas to the window at integer scale.
    pub fn end(&self) {
        set_default_camera();
        clear_background(BLACK);

        let scale = (screen_width() / self.width)
            .min(screen_height() / self.height)
            .floor()
            .max(1.0);
        let dest = vec2(self.width * scale, self.height * scale);
        let x = ((screen_width() - dest.x) / 2.0).floor();
        let y = ((screen_height() - dest.y) / 2.0).floor();

        draw_texture_ex(
            &self.target.texture,
            x,
            y,
            WHITE,
            DrawTextureParams {
                dest_size: Some(dest),
                // from_display_rect cameras render y-up into the target
                flip_y: true,
                ..Default::default()
            },
        );
    }
}
