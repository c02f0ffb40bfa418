//! Win screen
//!
//! The chest at the bottom of the last level was reached. Confirming
//! resets the descent so a fresh run starts from the top.

use std::rc::Rc;

use crate::camera::{VIEW_HEIGHT, VIEW_WIDTH};
use crate::ctx::Ctx;
use crate::input::Action;
use crate::render::text::draw_bitmap_text;
use crate::save::keys;
use crate::scenes::SceneRequest;

pub struct WinScene {
    gold: u32,
    elapsed: f32,
}

impl WinScene {
    pub async fn load(ctx: &Rc<Ctx>) -> WinScene {
        let gold = ctx.save.borrow().get_or(keys::GOLD, 0u32);
        WinScene { gold, elapsed: 0.0 }
    }

    pub fn update(&mut self, ctx: &Rc<Ctx>, dt: f32) -> Option<SceneRequest> {
        self.elapsed += dt;
        if self.elapsed < 0.5 {
            return None;
        }

        if ctx.input.borrow().is_pressed(Action::Confirm) {
            ctx.save.borrow_mut().set(keys::LEVEL_INDEX, 0usize);
            return Some(SceneRequest::MainMenu);
        }
        None
    }

    pub fn draw(&mut self, ctx: &Ctx, _dt: f32) {
        let font = ctx.font.borrow();
        let font = font.as_deref();
        let center_x = VIEW_WIDTH / 2.0;

        draw_bitmap_text(font, "you found the chest!", center_x, 80.0, true);
        draw_bitmap_text(
            font,
            &format!("final gold: {}", self.gold),
            center_x,
            104.0,
            true,
        );
        if self.elapsed >= 0.5 {
            draw_bitmap_text(font, "enter to finish", center_x, VIEW_HEIGHT - 44.0, true);
        }
    }
}
