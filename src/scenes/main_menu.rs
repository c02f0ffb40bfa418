//! Title screen

use std::rc::Rc;

use crate::camera::{VIEW_HEIGHT, VIEW_WIDTH};
use crate::ctx::Ctx;
use crate::input::Action;
use crate::render::text::draw_bitmap_text;
use crate::save::keys;
use crate::scenes::SceneRequest;

const ROWS: [&str; 2] = ["descend", "reset save"];

pub struct MainMenuScene {
    selected: usize,
    blink: f32,
}

impl MainMenuScene {
    pub fn new(_ctx: &Rc<Ctx>) -> Self {
        Self { selected: 0, blink: 0.0 }
    }

    pub fn update(&mut self, ctx: &Rc<Ctx>, dt: f32) -> Option<SceneRequest> {
        self.blink += dt;

        let (up, down, confirm) = {
            let input = ctx.input.borrow();
            (
                input.is_pressed(Action::MenuUp),
                input.is_pressed(Action::MenuDown),
                input.is_pressed(Action::Confirm),
            )
        };

        if up {
            self.selected = (self.selected + ROWS.len() - 1) % ROWS.len();
        }
        if down {
            self.selected = (self.selected + 1) % ROWS.len();
        }

        if confirm {
            match self.selected {
                0 => return Some(SceneRequest::Mine),
                _ => ctx.save.borrow_mut().clear(),
            }
        }
        None
    }

    pub fn draw(&mut self, ctx: &Ctx, _dt: f32) {
        let font = ctx.font.borrow();
        let font = font.as_deref();
        let center_x = VIEW_WIDTH / 2.0;

        draw_bitmap_text(font, "deeplight", center_x, 60.0, true);

        let depth = ctx.save.borrow().get_or(keys::LEVEL_INDEX, 0usize) + 1;
        let gold = ctx.save.borrow().get_or(keys::GOLD, 0u32);
        draw_bitmap_text(
            font,
            &format!("depth {}  gold {}", depth, gold),
            center_x,
            84.0,
            true,
        );

        for (i, row) in ROWS.iter().enumerate() {
            let y = 130.0 + i as f32 * 14.0;
            let text = if i == self.selected {
                format!("> {} <", row)
            } else {
                row.to_string()
            };
            draw_bitmap_text(font, &text, center_x, y, true);
        }

        if self.blink % 1.0 < 0.6 {
            draw_bitmap_text(font, "enter to confirm", center_x, VIEW_HEIGHT - 24.0, true);
        }
    }
}
