//! Prices and gold
//!
//! Sell values for mined items, upgrade pricing with a geometric scale for
//! leveled upgrades, and the gold cap.

use serde::{Deserialize, Serialize};

pub const GOLD_CAP: u32 = 999;
pub const UPGRADE_PRICE_SCALE: f32 = 1.5;

/// Everything a block can drop into the inventory.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum ItemKind {
    Dirt,
    Coal,
    Iron,
    Emerald,
    Diamond,
}

impl ItemKind {
    pub fn sell_price(self) -> u32 {
        match self {
            ItemKind::Dirt => 0,
            ItemKind::Coal => 1,
            ItemKind::Iron => 3,
            ItemKind::Emerald => 5,
            ItemKind::Diamond => 10,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ItemKind::Dirt => "dirt",
            ItemKind::Coal => "coal",
            ItemKind::Iron => "iron",
            ItemKind::Emerald => "emerald",
            ItemKind::Diamond => "diamond",
        }
    }
}

/// Shop upgrades. Pickaxe and lantern level up repeatedly; the charm and
/// boots are one-time purchases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpgradeKind {
    Pickaxe,
    Lantern,
    LuckyCharm,
    Boots,
}

impl UpgradeKind {
    pub fn base_price(self) -> u32 {
        match self {
            UpgradeKind::Pickaxe => 5,
            UpgradeKind::Lantern => 5,
            UpgradeKind::LuckyCharm => 20,
            UpgradeKind::Boots => 50,
        }
    }

    pub fn is_leveled(self) -> bool {
        matches!(self, UpgradeKind::Pickaxe | UpgradeKind::Lantern)
    }

    pub fn label(self) -> &'static str {
        match self {
            UpgradeKind::Pickaxe => "pickaxe",
            UpgradeKind::Lantern => "lantern",
            UpgradeKind::LuckyCharm => "lucky charm",
            UpgradeKind::Boots => "boots",
        }
    }
}

/// Price of the next purchase given how many levels are already owned.
/// Leveled upgrades scale geometrically; one-time upgrades stay flat.
pub fn next_price(kind: UpgradeKind, owned_levels: u32) -> u32 {
    let base = kind.base_price();
    if !kind.is_leveled() {
        return base;
    }
    (base as f32 * UPGRADE_PRICE_SCALE.powi(owned_levels as i32)).round() as u32
}

/// Add gold, saturating at the cap.
pub fn add_gold(gold: u32, amount: u32) -> u32 {
    gold.saturating_add(amount).min(GOLD_CAP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leveled_upgrades_scale_geometrically() {
        assert_eq!(next_price(UpgradeKind::Pickaxe, 0), 5);
        assert_eq!(next_price(UpgradeKind::Pickaxe, 1), 8); // 7.5 rounds up
        assert_eq!(next_price(UpgradeKind::Pickaxe, 2), 11); // 11.25 rounds down
        assert_eq!(next_price(UpgradeKind::Lantern, 3), 17); // 16.875
    }

    #[test]
    fn one_time_upgrades_stay_flat() {
        assert_eq!(next_price(UpgradeKind::Boots, 0), 50);
        assert_eq!(next_price(UpgradeKind::LuckyCharm, 0), 20);
    }

    #[test]
    fn gold_saturates_at_cap() {
        assert_eq!(add_gold(0, 10), 10);
        assert_eq!(add_gold(990, 100), GOLD_CAP);
        assert_eq!(add_gold(GOLD_CAP, 1), GOLD_CAP);
    }

    #[test]
    fn item_kind_serializes_as_kebab_case_string() {
        let json = serde_json::to_string(&ItemKind::Diamond).unwrap();
        assert_eq!(json, "\"diamond\"");
        let back: ItemKind = serde_json::from_str("\"coal\"").unwrap();
        assert_eq!(back, ItemKind::Coal);
    }

    #[test]
    fn inventory_maps_serialize_with_string_keys() {
        use std::collections::BTreeMap;
        let mut inventory = BTreeMap::new();
        inventory.insert(ItemKind::Coal, 3u32);
        inventory.insert(ItemKind::Iron, 1u32);
        let json = serde_json::to_string(&inventory).unwrap();
        assert_eq!(json, "{\"coal\":3,\"iron\":1}");
    }
}
