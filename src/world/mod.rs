//! Block world
//!
//! Owns every block in the current level behind generational ids, plus a
//! `(col,row) -> id` grid for spatial queries. Attached blocks live in the
//! grid; falling blocks leave it and are tracked separately until they land
//! and snap back onto a cell.
//!
//! `update` runs the block state machine: unsupported dirt shakes loose,
//! loose blocks fall under gravity and land on whatever is beneath them.
//! Transitions are returned to the caller rather than dispatched here, so
//! events fire only once the world borrow has been released.

pub mod block;
pub mod level;

pub use block::{Block, BlockKind};
pub use level::{cell_origin, parse_level, LevelData, CELL_SIZE};

use std::collections::HashMap;

use macroquad::math::{vec2, Vec2};

use crate::physics::{resolve_aabb, Side};
use crate::physics::Aabb;

use level::{AIR_CODE, PLAYER_START_CODE};

/// Downward acceleration on loose blocks, px/s^2.
pub const BLOCK_GRAVITY: f32 = 800.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId {
    index: u32,
    generation: u32,
}

struct Slot {
    generation: u32,
    block: Option<Block>,
}

/// State-machine transitions from one `update`, for the scene to turn into
/// events.
#[derive(Debug, Default)]
pub struct Transitions {
    pub started_falling: Vec<BlockId>,
    pub landed: Vec<BlockId>,
}

pub struct World {
    slots: Vec<Slot>,
    free: Vec<u32>,
    grid: HashMap<(i32, i32), BlockId>,
    airborne: Vec<BlockId>,
    pub width: usize,
    pub height: usize,
    pub player_start: Vec2,
}

impl World {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            grid: HashMap::new(),
            airborne: Vec::new(),
            width,
            height,
            player_start: Vec2::ZERO,
        }
    }

    pub fn from_level(level: &LevelData) -> Self {
        let mut world = World::new(level.meta.width, level.meta.height);
        for (i, &code) in level.blocks.iter().enumerate() {
            let origin = cell_origin(i, level.meta.width);
            match code {
                AIR_CODE => {}
                PLAYER_START_CODE => world.player_start = origin,
                code => {
                    if let Some(kind) = BlockKind::from_code(code) {
                        world.insert(Block::new(kind, origin));
                    }
                }
            }
        }
        world
    }

    /// Cell containing a world point.
    pub fn cell_containing(point: Vec2) -> (i32, i32) {
        (
            (point.x / CELL_SIZE).floor() as i32,
            (point.y / CELL_SIZE).floor() as i32,
        )
    }

    fn home_cell(block: &Block) -> (i32, i32) {
        Self::cell_containing(block.center())
    }

    pub fn insert(&mut self, block: Block) -> BlockId {
        let airborne = block.is_airborne;
        let cell = Self::home_cell(&block);
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.block = Some(block);
                BlockId { index, generation: slot.generation }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot { generation: 0, block: Some(block) });
                BlockId { index, generation: 0 }
            }
        };
        if airborne {
            self.airborne.push(id);
        } else {
            self.grid.insert(cell, id);
        }
        id
    }

    pub fn remove(&mut self, id: BlockId) -> Option<Block> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let block = slot.block.take()?;
        slot.generation += 1;
        self.free.push(id.index);
        let cell = Self::home_cell(&block);
        if self.grid.get(&cell) == Some(&id) {
            self.grid.remove(&cell);
        }
        self.airborne.retain(|a| *a != id);
        Some(block)
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.block.as_ref()
    }

    pub fn get_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.block.as_mut()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.block.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (BlockId, &Block)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.block
                .as_ref()
                .map(|b| (BlockId { index: i as u32, generation: slot.generation }, b))
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (BlockId, &mut Block)> + '_ {
        self.slots.iter_mut().enumerate().filter_map(|(i, slot)| {
            let generation = slot.generation;
            slot.block
                .as_mut()
                .map(move |b| (BlockId { index: i as u32, generation }, b))
        })
    }

    pub fn id_at_cell(&self, col: i32, row: i32) -> Option<BlockId> {
        self.grid.get(&(col, row)).copied()
    }

    /// Ids of blocks whose boxes overlap `bounds`: grid hits for attached
    /// blocks plus a scan of the (few) airborne ones.
    pub fn ids_overlapping(&self, bounds: Aabb) -> Vec<BlockId> {
        let mut hits = Vec::new();
        let (min_col, min_row) = Self::cell_containing(vec2(bounds.x, bounds.y));
        let (max_col, max_row) =
            Self::cell_containing(vec2(bounds.right() - 0.001, bounds.bottom() - 0.001));
        for row in min_row..=max_row {
            for col in min_col..=max_col {
                if let Some(id) = self.grid.get(&(col, row)) {
                    hits.push(*id);
                }
            }
        }
        for &id in &self.airborne {
            if let Some(block) = self.get(id) {
                if block.collision_box().overlaps(&bounds) {
                    hits.push(id);
                }
            }
        }
        hits
    }

    /// Try to knock an attached block loose. Only dirt with an empty cell
    /// below and no neighbor on either side lets go. Returns whether the
    /// block started falling.
    pub fn attempt_to_shake_loose(&mut self, id: BlockId) -> bool {
        let Some(block) = self.get(id) else { return false };
        if !block.kind.can_shake_loose() || block.is_airborne || block.should_destroy {
            return false;
        }
        let (col, row) = Self::home_cell(block);
        let supported = self.grid.contains_key(&(col, row + 1))
            || self.grid.contains_key(&(col - 1, row))
            || self.grid.contains_key(&(col + 1, row));
        if supported {
            return false;
        }
        self.grid.remove(&(col, row));
        self.airborne.push(id);
        if let Some(block) = self.get_mut(id) {
            block.should_apply_gravity = true;
            block.is_airborne = true;
        }
        true
    }

    /// Advance the block state machine one step.
    pub fn update(&mut self, dt: f32) -> Transitions {
        let mut transitions = Transitions::default();

        // Unsupported dirt lets go
        let attached: Vec<BlockId> = self.grid.values().copied().collect();
        for id in attached {
            if self.attempt_to_shake_loose(id) {
                transitions.started_falling.push(id);
            }
        }

        // Integrate falling blocks and land them
        let falling = self.airborne.clone();
        for id in falling {
            let Some(slot) = self.slots.get_mut(id.index as usize) else { continue };
            if slot.generation != id.generation {
                continue;
            }
            let Some(mut block) = slot.block.take() else { continue };

            if block.should_apply_gravity {
                block.velocity.y += BLOCK_GRAVITY * dt;
                block.position += block.velocity * dt;
            }

            let mut landed = false;
            for other_id in self.ids_overlapping(block.collision_box()) {
                if other_id == id {
                    continue;
                }
                let Some(other) = self.get(other_id) else { continue };
                if other.kind.is_intangible() {
                    continue;
                }
                let bounds = block.collision_box();
                let other_bounds = other.collision_box();
                if !bounds.overlaps(&other_bounds) {
                    continue;
                }
                let r = resolve_aabb(
                    bounds,
                    block.velocity.x,
                    block.velocity.y,
                    other_bounds,
                );
                if r.side == Side::Bottom && block.velocity.y >= 0.0 {
                    landed = true;
                }
                block.position = vec2(r.x, r.y);
                block.velocity = vec2(r.vx, r.vy);
            }

            if landed {
                // Snap onto the cell it stopped in
                let col = (block.position.x / CELL_SIZE).round() as i32;
                let row = (block.position.y / CELL_SIZE).round() as i32;
                block.position = vec2(col as f32 * CELL_SIZE, row as f32 * CELL_SIZE);
                block.velocity = Vec2::ZERO;
                block.is_airborne = false;
                block.should_apply_gravity = false;
                self.airborne.retain(|a| *a != id);
                self.grid.insert((col, row), id);
                transitions.landed.push(id);
            }

            self.slots[id.index as usize].block = Some(block);
        }

        transitions
    }

    /// Remove every block whose durability ran out, returning them so the
    /// caller can react to where they were.
    pub fn sweep_destroyed(&mut self) -> Vec<Block> {
        let doomed: Vec<BlockId> = self
            .iter()
            .filter(|(_, b)| b.should_destroy)
            .map(|(id, _)| id)
            .collect();
        doomed.into_iter().filter_map(|id| self.remove(id)).collect()
    }

    pub fn selected_id(&self) -> Option<BlockId> {
        self.iter().find(|(_, b)| b.is_selected).map(|(id, _)| id)
    }

    pub fn clear_selection(&mut self) {
        for (_, block) in self.iter_mut() {
            block.is_selected = false;
        }
    }

    /// Death boxes of every falling block, for crush checks and particles.
    pub fn death_boxes(&self) -> Vec<Aabb> {
        self.airborne
            .iter()
            .filter_map(|id| self.get(*id))
            .filter_map(|b| b.death_box())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level_from(width: usize, height: usize, blocks: Vec<i32>) -> LevelData {
        let json = format!(
            r#"{{"meta":{{"width":{},"height":{},"baseLevelTimeInSeconds":60}},"blocks":{:?}}}"#,
            width, height, blocks
        );
        parse_level(&json).unwrap()
    }

    #[test]
    fn builds_world_from_level_data() {
        let level = level_from(3, 2, vec![-1, 1, 0, 9, 9, 9]);
        let world = World::from_level(&level);
        assert_eq!(world.player_start, vec2(0.0, 0.0));
        assert_eq!(world.len(), 4);
        let id = world.id_at_cell(1, 0).unwrap();
        assert_eq!(world.get(id).unwrap().kind, BlockKind::Dirt);
        assert!(world.id_at_cell(2, 0).is_none());
    }

    #[test]
    fn stale_ids_go_dead_after_removal() {
        let mut world = World::new(4, 4);
        let id = world.insert(Block::new(BlockKind::Dirt, vec2(0.0, 0.0)));
        assert!(world.get(id).is_some());
        world.remove(id);
        assert!(world.get(id).is_none());

        // Slot reuse must not resurrect the old id
        let id2 = world.insert(Block::new(BlockKind::Stone, vec2(32.0, 0.0)));
        assert!(world.get(id).is_none());
        assert_eq!(world.get(id2).unwrap().kind, BlockKind::Stone);
    }

    #[test]
    fn unsupported_dirt_shakes_loose_in_one_attempt() {
        // Dirt at (0,0), nothing beside or below it
        let mut world = World::new(1, 4);
        let dirt = world.insert(Block::new(BlockKind::Dirt, vec2(0.0, 0.0)));

        assert!(world.attempt_to_shake_loose(dirt));
        let block = world.get(dirt).unwrap();
        assert!(block.should_apply_gravity);
        assert!(block.is_airborne);
        assert!(world.id_at_cell(0, 0).is_none());
    }

    #[test]
    fn supported_dirt_stays_put() {
        let mut world = World::new(3, 3);
        // Dirt resting on bedrock
        let resting = world.insert(Block::new(BlockKind::Dirt, vec2(32.0, 0.0)));
        world.insert(Block::new(BlockKind::Bedrock, vec2(32.0, 32.0)));
        assert!(!world.attempt_to_shake_loose(resting));

        // Dirt held by a side neighbor
        let mut world = World::new(3, 3);
        let held = world.insert(Block::new(BlockKind::Dirt, vec2(32.0, 0.0)));
        world.insert(Block::new(BlockKind::Stone, vec2(64.0, 0.0)));
        assert!(!world.attempt_to_shake_loose(held));
    }

    #[test]
    fn non_dirt_never_shakes_loose() {
        let mut world = World::new(1, 4);
        let stone = world.insert(Block::new(BlockKind::Stone, vec2(0.0, 0.0)));
        assert!(!world.attempt_to_shake_loose(stone));
    }

    #[test]
    fn loose_dirt_falls_and_lands_exactly_once() {
        // Dirt at row 0, bedrock at row 3, two empty rows between (the
        // start marker leaves its cell empty)
        let level = level_from(1, 4, vec![1, 0, -1, 9]);
        let mut world = World::from_level(&level);
        let dirt = world.id_at_cell(0, 0).unwrap();

        let mut started = 0;
        let mut landed = 0;
        for _ in 0..600 {
            let t = world.update(1.0 / 60.0);
            started += t.started_falling.len();
            landed += t.landed.len();
        }
        assert_eq!(started, 1);
        assert_eq!(landed, 1);

        let block = world.get(dirt).unwrap();
        assert_eq!(block.position, vec2(0.0, 64.0));
        assert_eq!(block.velocity, Vec2::ZERO);
        assert!(!block.is_airborne);
        assert!(!block.should_apply_gravity);
        assert_eq!(world.id_at_cell(0, 2), Some(dirt));
        assert!(world.death_boxes().is_empty());
    }

    #[test]
    fn falling_block_exposes_a_death_box() {
        let level = level_from(1, 4, vec![1, 0, -1, 9]);
        let mut world = World::from_level(&level);
        world.update(1.0 / 60.0);
        assert_eq!(world.death_boxes().len(), 1);
    }

    #[test]
    fn ids_overlapping_finds_grid_blocks() {
        let level = level_from(3, 2, vec![9, 9, -1, 9, 9, 9]);
        let world = World::from_level(&level);

        let hits = world.ids_overlapping(Aabb::new(30.0, 0.0, 16.0, 16.0));
        assert_eq!(hits.len(), 2);

        let hits = world.ids_overlapping(Aabb::new(200.0, 200.0, 16.0, 16.0));
        assert!(hits.is_empty());
    }

    #[test]
    fn sweep_removes_destroyed_blocks() {
        let mut world = World::new(2, 1);
        let a = world.insert(Block::new(BlockKind::Dirt, vec2(0.0, 0.0)));
        let b = world.insert(Block::new(BlockKind::Stone, vec2(32.0, 0.0)));
        world.get_mut(a).unwrap().should_destroy = true;

        let removed = world.sweep_destroyed();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].kind, BlockKind::Dirt);
        assert!(world.get(a).is_none());
        assert!(world.get(b).is_some());
        assert!(world.id_at_cell(0, 0).is_none());
    }

    #[test]
    fn selection_helpers_track_a_single_block() {
        let mut world = World::new(2, 1);
        let a = world.insert(Block::new(BlockKind::Dirt, vec2(0.0, 0.0)));
        world.insert(Block::new(BlockKind::Stone, vec2(32.0, 0.0)));
        assert!(world.selected_id().is_none());

        world.get_mut(a).unwrap().is_selected = true;
        assert_eq!(world.selected_id(), Some(a));

        world.clear_selection();
        assert!(world.selected_id().is_none());
    }
}
