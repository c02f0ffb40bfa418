//! Death screen
//!
//! The lantern went out or a block came down. Upgrades and gold persist;
//! the run restarts on the same level.

use std::rc::Rc;

use crate::camera::{VIEW_HEIGHT, VIEW_WIDTH};
use crate::ctx::Ctx;
use crate::input::Action;
use crate::render::text::draw_bitmap_text;
use crate::scenes::SceneRequest;

pub struct DeathScene {
    elapsed: f32,
}

impl DeathScene {
    pub async fn load(_ctx: &Rc<Ctx>) -> DeathScene {
        DeathScene { elapsed: 0.0 }
    }

    pub fn update(&mut self, ctx: &Rc<Ctx>, dt: f32) -> Option<SceneRequest> {
        self.elapsed += dt;
        // Swallow the first moments so a held key does not skip the screen
        if self.elapsed < 0.5 {
            return None;
        }

        let input = ctx.input.borrow();
        if input.is_pressed(Action::Confirm) {
            return Some(SceneRequest::Mine);
        }
        if input.is_pressed(Action::Back) {
            return Some(SceneRequest::MainMenu);
        }
        None
    }

    pub fn draw(&mut self, ctx: &Ctx, _dt: f32) {
        let font = ctx.font.borrow();
        let font = font.as_deref();
        let center_x = VIEW_WIDTH / 2.0;

        draw_bitmap_text(font, "the light went out", center_x, 90.0, true);
        if self.elapsed >= 0.5 {
            draw_bitmap_text(font, "enter to try again", center_x, VIEW_HEIGHT - 60.0, true);
            draw_bitmap_text(font, "esc for menu", center_x, VIEW_HEIGHT - 44.0, true);
        }
    }
}
