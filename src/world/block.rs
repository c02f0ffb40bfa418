//! Block kinds and per-block state
//!
//! A block is a 32x32 world tile with a small state machine: attached to the
//! grid, being mined, shaken loose and falling, landed, or destroyed.
//! Durability and drops are per-kind lookup tables.

use macroquad::color::Color;
use macroquad::math::{vec2, Vec2};

use crate::economy::ItemKind;
use crate::physics::Aabb;

use super::level::CELL_SIZE;

/// While airborne, a block kills the player through a box inset by this
/// much, so a near miss does not count as being crushed.
const DEATH_BOX_INSET: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Dirt,
    Stone,
    CoalOre,
    IronOre,
    EmeraldOre,
    DiamondOre,
    Chest,
    Exit,
    Bedrock,
    DeepBedrock,
}

impl BlockKind {
    /// Level-data cell code to kind. `0` is air and `-1` the player start;
    /// both are handled before this is asked.
    pub fn from_code(code: i32) -> Option<BlockKind> {
        match code {
            1 => Some(BlockKind::Dirt),
            2 => Some(BlockKind::Stone),
            3 => Some(BlockKind::CoalOre),
            4 => Some(BlockKind::IronOre),
            5 => Some(BlockKind::EmeraldOre),
            6 => Some(BlockKind::DiamondOre),
            7 => Some(BlockKind::Chest),
            8 => Some(BlockKind::Exit),
            9 => Some(BlockKind::Bedrock),
            10 => Some(BlockKind::DeepBedrock),
            _ => None,
        }
    }

    /// Mining ticks to destroy, at strength 1 per tick. Unmineable kinds
    /// report infinite durability and simply never deplete.
    pub fn max_durability(self) -> f32 {
        match self {
            BlockKind::Dirt => 3.0,
            BlockKind::Stone => 10.0,
            BlockKind::CoalOre => 6.0,
            BlockKind::IronOre => 10.0,
            BlockKind::EmeraldOre => 12.0,
            BlockKind::DiamondOre => 16.0,
            BlockKind::Chest
            | BlockKind::Exit
            | BlockKind::Bedrock
            | BlockKind::DeepBedrock => f32::INFINITY,
        }
    }

    /// What lands in the inventory when this block is destroyed.
    pub fn drop_table(self) -> Option<(ItemKind, u32)> {
        match self {
            BlockKind::Dirt => Some((ItemKind::Dirt, 1)),
            BlockKind::CoalOre => Some((ItemKind::Coal, 1)),
            BlockKind::IronOre => Some((ItemKind::Iron, 1)),
            BlockKind::EmeraldOre => Some((ItemKind::Emerald, 1)),
            BlockKind::DiamondOre => Some((ItemKind::Diamond, 1)),
            BlockKind::Stone
            | BlockKind::Chest
            | BlockKind::Exit
            | BlockKind::Bedrock
            | BlockKind::DeepBedrock => None,
        }
    }

    pub fn is_mineable(self) -> bool {
        matches!(
            self,
            BlockKind::Dirt
                | BlockKind::Stone
                | BlockKind::CoalOre
                | BlockKind::IronOre
                | BlockKind::EmeraldOre
                | BlockKind::DiamondOre
        )
    }

    /// Interactables: the player passes through them and touching them
    /// triggers a scene action instead of a collision.
    pub fn is_intangible(self) -> bool {
        matches!(self, BlockKind::Chest | BlockKind::Exit)
    }

    /// Only dirt loses its grip when unsupported.
    pub fn can_shake_loose(self) -> bool {
        matches!(self, BlockKind::Dirt)
    }

    /// Atlas frame for the sprite sheet.
    pub fn frame_name(self) -> &'static str {
        match self {
            BlockKind::Dirt => "dirt",
            BlockKind::Stone => "stone",
            BlockKind::CoalOre => "coal-ore",
            BlockKind::IronOre => "iron-ore",
            BlockKind::EmeraldOre => "emerald-ore",
            BlockKind::DiamondOre => "diamond-ore",
            BlockKind::Chest => "chest",
            BlockKind::Exit => "exit",
            BlockKind::Bedrock => "bedrock",
            BlockKind::DeepBedrock => "deep-bedrock",
        }
    }

    /// Flat fill used when the sprite sheet is unavailable.
    pub fn fallback_color(self) -> Color {
        match self {
            BlockKind::Dirt => Color::from_rgba(121, 85, 58, 255),
            BlockKind::Stone => Color::from_rgba(110, 110, 115, 255),
            BlockKind::CoalOre => Color::from_rgba(54, 54, 54, 255),
            BlockKind::IronOre => Color::from_rgba(190, 150, 120, 255),
            BlockKind::EmeraldOre => Color::from_rgba(60, 180, 100, 255),
            BlockKind::DiamondOre => Color::from_rgba(120, 220, 230, 255),
            BlockKind::Chest => Color::from_rgba(200, 160, 60, 255),
            BlockKind::Exit => Color::from_rgba(40, 30, 60, 255),
            BlockKind::Bedrock => Color::from_rgba(60, 60, 70, 255),
            BlockKind::DeepBedrock => Color::from_rgba(35, 35, 45, 255),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Block {
    pub kind: BlockKind,
    /// Top-left corner, world pixels. Cell-aligned unless falling.
    pub position: Vec2,
    pub velocity: Vec2,
    pub durability: f32,
    pub is_selected: bool,
    pub is_being_mined: bool,
    pub is_airborne: bool,
    pub should_apply_gravity: bool,
    pub should_destroy: bool,
}

impl Block {
    pub fn new(kind: BlockKind, position: Vec2) -> Self {
        Self {
            kind,
            position,
            velocity: Vec2::ZERO,
            durability: kind.max_durability(),
            is_selected: false,
            is_being_mined: false,
            is_airborne: false,
            should_apply_gravity: false,
            should_destroy: false,
        }
    }

    pub fn collision_box(&self) -> Aabb {
        Aabb::new(self.position.x, self.position.y, CELL_SIZE, CELL_SIZE)
    }

    /// Lethal region, present only while the block is falling.
    pub fn death_box(&self) -> Option<Aabb> {
        if self.is_airborne {
            Some(self.collision_box().inset(DEATH_BOX_INSET))
        } else {
            None
        }
    }

    pub fn center(&self) -> Vec2 {
        self.position + vec2(CELL_SIZE / 2.0, CELL_SIZE / 2.0)
    }

    /// Fraction of durability remaining, for the crack overlay.
    pub fn durability_fraction(&self) -> f32 {
        let max = self.kind.max_durability();
        if max.is_finite() {
            (self.durability / max).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    /// Apply one mining hit. Returns the drop when this hit destroys the
    /// block. Unmineable and already-destroyed blocks ignore hits.
    pub fn mine(&mut self, strength: f32) -> Option<(ItemKind, u32)> {
        if !self.kind.is_mineable() || self.should_destroy {
            return None;
        }
        self.durability -= strength;
        if self.durability <= 0.0 {
            self.durability = 0.0;
            self.should_destroy = true;
            self.kind.drop_table()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dirt_breaks_after_three_hits_and_drops_dirt() {
        let mut block = Block::new(BlockKind::Dirt, vec2(0.0, 0.0));
        assert_eq!(block.mine(1.0), None);
        assert_eq!(block.mine(1.0), None);
        assert!(!block.should_destroy);
        assert_eq!(block.mine(1.0), Some((ItemKind::Dirt, 1)));
        assert!(block.should_destroy);
        assert_eq!(block.durability, 0.0);
    }

    #[test]
    fn destroyed_blocks_ignore_further_hits() {
        let mut block = Block::new(BlockKind::Dirt, vec2(0.0, 0.0));
        block.mine(10.0);
        assert!(block.should_destroy);
        assert_eq!(block.mine(1.0), None);
    }

    #[test]
    fn stone_drops_nothing() {
        let mut block = Block::new(BlockKind::Stone, vec2(0.0, 0.0));
        for _ in 0..9 {
            assert_eq!(block.mine(1.0), None);
        }
        assert_eq!(block.mine(1.0), None);
        assert!(block.should_destroy);
    }

    #[test]
    fn bedrock_never_depletes() {
        let mut block = Block::new(BlockKind::Bedrock, vec2(0.0, 0.0));
        for _ in 0..10_000 {
            assert_eq!(block.mine(1.0), None);
        }
        assert!(!block.should_destroy);
        assert!(block.durability.is_infinite());
    }

    #[test]
    fn death_box_exists_only_while_airborne() {
        let mut block = Block::new(BlockKind::Dirt, vec2(64.0, 32.0));
        assert!(block.death_box().is_none());
        block.is_airborne = true;
        let death = block.death_box().unwrap();
        assert_eq!(death, Aabb::new(68.0, 36.0, 24.0, 24.0));
    }

    #[test]
    fn ore_drops_match_their_kind() {
        for (kind, item) in [
            (BlockKind::CoalOre, ItemKind::Coal),
            (BlockKind::IronOre, ItemKind::Iron),
            (BlockKind::EmeraldOre, ItemKind::Emerald),
            (BlockKind::DiamondOre, ItemKind::Diamond),
        ] {
            assert_eq!(kind.drop_table(), Some((item, 1)));
        }
    }
}
