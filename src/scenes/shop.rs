//! The shop
//!
//! Between descents: sell the inventory, buy upgrades, head back down.
//! Every purchase writes through to the save immediately.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::audio::{Cue, SoundBank};
use crate::camera::{VIEW_HEIGHT, VIEW_WIDTH};
use crate::ctx::Ctx;
use crate::economy::{add_gold, next_price, ItemKind, UpgradeKind};
use crate::input::Action;
use crate::render::text::draw_bitmap_text;
use crate::save::keys;
use crate::scenes::SceneRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Row {
    Sell,
    Upgrade(UpgradeKind),
    Descend,
}

const ROWS: [Row; 6] = [
    Row::Sell,
    Row::Upgrade(UpgradeKind::Pickaxe),
    Row::Upgrade(UpgradeKind::Lantern),
    Row::Upgrade(UpgradeKind::LuckyCharm),
    Row::Upgrade(UpgradeKind::Boots),
    Row::Descend,
];

pub struct ShopScene {
    selected: usize,
    status: String,
    sounds: Rc<SoundBank>,
}

impl ShopScene {
    pub async fn load(_ctx: &Rc<Ctx>) -> ShopScene {
        ShopScene {
            selected: 0,
            status: String::new(),
            sounds: Rc::new(SoundBank::load().await),
        }
    }

    pub fn update(&mut self, ctx: &Rc<Ctx>, _dt: f32) -> Option<SceneRequest> {
        let (up, down, confirm, back) = {
            let input = ctx.input.borrow();
            (
                input.is_pressed(Action::MenuUp),
                input.is_pressed(Action::MenuDown),
                input.is_pressed(Action::Confirm),
                input.is_pressed(Action::Back),
            )
        };

        if back {
            return Some(SceneRequest::MainMenu);
        }
        if up {
            self.selected = (self.selected + ROWS.len() - 1) % ROWS.len();
            self.sounds.play(Cue::Select);
        }
        if down {
            self.selected = (self.selected + 1) % ROWS.len();
            self.sounds.play(Cue::Select);
        }
        if !confirm {
            return None;
        }

        match ROWS[self.selected] {
            Row::Sell => self.sell_inventory(ctx),
            Row::Upgrade(kind) => self.buy_upgrade(ctx, kind),
            Row::Descend => return Some(SceneRequest::Mine),
        }
        None
    }

    fn sell_inventory(&mut self, ctx: &Rc<Ctx>) {
        let mut save = ctx.save.borrow_mut();
        let inventory: BTreeMap<ItemKind, u32> = save.get(keys::INVENTORY).unwrap_or_default();
        let total: u32 = inventory
            .iter()
            .map(|(item, qty)| item.sell_price() * qty)
            .sum();
        if total == 0 && inventory.is_empty() {
            self.status = "nothing to sell".into();
            return;
        }

        let gold = add_gold(save.get_or(keys::GOLD, 0u32), total);
        save.set(keys::GOLD, gold);
        save.remove(keys::INVENTORY);
        self.sounds.play(Cue::Select);
        self.status = format!("sold for {} gold", total);
    }

    fn buy_upgrade(&mut self, ctx: &Rc<Ctx>, kind: UpgradeKind) {
        let mut save = ctx.save.borrow_mut();
        let owned = owned_levels(&save, kind);

        if !kind.is_leveled() && owned > 0 {
            self.status = format!("{} already owned", kind.label());
            return;
        }

        let price = next_price(kind, owned);
        let gold = save.get_or(keys::GOLD, 0u32);
        if gold < price {
            self.status = format!("need {} gold", price);
            return;
        }

        save.set(keys::GOLD, gold - price);
        match kind {
            UpgradeKind::Pickaxe => save.set(keys::PICKAXE_LEVEL, owned + 1),
            UpgradeKind::Lantern => save.set(keys::LANTERN_LEVEL, owned + 1),
            UpgradeKind::LuckyCharm => save.set(keys::LUCKY_CHARM_OWNED, true),
            UpgradeKind::Boots => save.set(keys::BOOTS_OWNED, true),
        }
        self.sounds.play(Cue::Select);
        self.status = format!("bought {}", kind.label());
    }

    pub fn draw(&mut self, ctx: &Ctx, _dt: f32) {
        let font = ctx.font.borrow();
        let font = font.as_deref();
        let center_x = VIEW_WIDTH / 2.0;
        let save = ctx.save.borrow();

        draw_bitmap_text(font, "shop", center_x, 20.0, true);
        draw_bitmap_text(
            font,
            &format!("gold {}", save.get_or(keys::GOLD, 0u32)),
            center_x,
            34.0,
            true,
        );

        for (i, row) in ROWS.iter().enumerate() {
            let label = match row {
                Row::Sell => {
                    let inventory: BTreeMap<ItemKind, u32> =
                        save.get(keys::INVENTORY).unwrap_or_default();
                    let worth: u32 = inventory
                        .iter()
                        .map(|(item, qty)| item.sell_price() * qty)
                        .sum();
                    format!("sell everything: {} gold", worth)
                }
                Row::Upgrade(kind) => {
                    let owned = owned_levels(&save, *kind);
                    if !kind.is_leveled() && owned > 0 {
                        format!("{}: owned", kind.label())
                    } else {
                        format!("{}: {} gold", kind.label(), next_price(*kind, owned))
                    }
                }
                Row::Descend => "descend".to_string(),
            };
            let text = if i == self.selected {
                format!("> {}", label)
            } else {
                format!("  {}", label)
            };
            draw_bitmap_text(font, &text, 60.0, 58.0 + i as f32 * 14.0, false);
        }

        if !self.status.is_empty() {
            draw_bitmap_text(font, &self.status, center_x, VIEW_HEIGHT - 40.0, true);
        }
        draw_bitmap_text(font, "esc for menu", center_x, VIEW_HEIGHT - 20.0, true);
    }
}

fn owned_levels(save: &crate::save::SaveState, kind: UpgradeKind) -> u32 {
    match kind {
        UpgradeKind::Pickaxe => save.get_or(keys::PICKAXE_LEVEL, 0),
        UpgradeKind::Lantern => save.get_or(keys::LANTERN_LEVEL, 0),
        UpgradeKind::LuckyCharm => save.get_or(keys::LUCKY_CHARM_OWNED, false) as u32,
        UpgradeKind::Boots => save.get_or(keys::BOOTS_OWNED, false) as u32,
    }
}
