//! Player controller
//!
//! Horizontal movement is direct (no inertia); vertical motion integrates
//! gravity with three regimes for a snappy jump arc: floaty near the apex,
//! heavy on the way down or when the jump key is released early. Jumping is
//! edge-triggered through a latch so holding the key never bounces.
//!
//! Mining is a repeating timer against the currently selected block: each
//! tick applies pickaxe strength, and the timer dies whenever the mine key
//! lifts, the player moves, or the target disappears.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use macroquad::color::WHITE;
use macroquad::math::{vec2, Vec2};
use macroquad::shapes::draw_rectangle;
use rand::rngs::SmallRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ctx::{stream_rng, Ctx};
use crate::economy::ItemKind;
use crate::entity::screen_position;
use crate::events::GameEvent;
use crate::physics::{resolve_aabb, Aabb, Side};
use crate::render::debug::{debug_rect, DebugColor};
use crate::render::sprite::{AnimationPlayer, Sprite};
use crate::save::{keys, SaveState};
use crate::timer::TimerHandle;
use crate::world::World;

/// Sprite footprint; the collision box is inset within it.
pub const PLAYER_SIZE: f32 = 16.0;

const MOVE_SPEED: f32 = 50.0;
const BOOTS_SPEED_SCALE: f32 = 1.4;
const JUMP_SPEED: f32 = 300.0;
const BASE_GRAVITY: f32 = 1000.0;
/// Heavier fall when descending or after the jump key lifts.
const FALL_GRAVITY_SCALE: f32 = 1.8;
/// Floatier gravity near the top of the arc.
const APEX_GRAVITY_SCALE: f32 = 0.5;
/// |vy| below this counts as the apex. Tunable, not load-bearing.
const APEX_WINDOW: f32 = 40.0;

const MINE_TICK: f32 = 0.25;
const MINE_TICK_SCALE: f32 = 0.85;
const MINE_TICK_MIN: f32 = 0.08;
const MINE_STRENGTH: f32 = 1.0;

const WALK_CADENCE: f32 = 0.28;

/// Lucky charm drop quantities, weighted 3:2:1 over 1/2/3.
const LUCKY_WEIGHTS: [(u32, u32); 3] = [(1, 3), (2, 2), (3, 1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MineDirection {
    Horizontal,
    Up,
    Down,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Upgrades {
    pub pickaxe_level: u32,
    pub lantern_level: u32,
    pub boots: bool,
    pub lucky_charm: bool,
}

impl Upgrades {
    pub fn from_save(save: &SaveState) -> Self {
        Self {
            pickaxe_level: save.get_or(keys::PICKAXE_LEVEL, 0),
            lantern_level: save.get_or(keys::LANTERN_LEVEL, 0),
            boots: save.get_or(keys::BOOTS_OWNED, false),
            lucky_charm: save.get_or(keys::LUCKY_CHARM_OWNED, false),
        }
    }
}

pub struct Player {
    /// Top-left of the 16x16 sprite, world pixels.
    pub position: Vec2,
    pub velocity: Vec2,
    /// -1 left, 1 right.
    pub facing_x: f32,
    pub mine_direction: MineDirection,
    pub is_airborne: bool,
    pub is_moving: bool,
    pub is_dead: bool,
    jump_latched: bool,
    inventory: BTreeMap<ItemKind, u32>,
    pub upgrades: Upgrades,
    mining_timer: Option<TimerHandle>,
    walk_timer: Option<TimerHandle>,
    anim: AnimationPlayer,
    rng: SmallRng,
}

impl Player {
    pub fn new(start: Vec2, save: &SaveState) -> Self {
        Self {
            position: start,
            velocity: Vec2::ZERO,
            facing_x: 1.0,
            mine_direction: MineDirection::Horizontal,
            is_airborne: true,
            is_moving: false,
            is_dead: false,
            jump_latched: false,
            inventory: save.get(keys::INVENTORY).unwrap_or_default(),
            upgrades: Upgrades::from_save(save),
            mining_timer: None,
            walk_timer: None,
            anim: AnimationPlayer::new(),
            rng: stream_rng(),
        }
    }

    /// Solid footprint: inset 4px from the sprite, 8x12.
    pub fn collision_box(&self) -> Aabb {
        Aabb::new(self.position.x + 4.0, self.position.y + 4.0, 8.0, 12.0)
    }

    /// Thin probe that selects the block being aimed at.
    pub fn probe_box(&self) -> Aabb {
        match self.mine_direction {
            MineDirection::Down => {
                Aabb::new(self.position.x + 8.0, self.position.y + 16.0, 1.0, 16.0)
            }
            MineDirection::Up => {
                Aabb::new(self.position.x + 8.0, self.position.y - 24.0, 1.0, 16.0)
            }
            MineDirection::Horizontal => Aabb::new(
                self.position.x + 12.0 * self.facing_x,
                self.position.y,
                16.0,
                1.0,
            ),
        }
    }

    pub fn inventory(&self) -> &BTreeMap<ItemKind, u32> {
        &self.inventory
    }

    fn move_speed(&self) -> f32 {
        if self.upgrades.boots {
            MOVE_SPEED * BOOTS_SPEED_SCALE
        } else {
            MOVE_SPEED
        }
    }

    /// Seconds between mining ticks, shrinking with pickaxe level.
    pub fn mine_interval(&self) -> f32 {
        (MINE_TICK * MINE_TICK_SCALE.powi(self.upgrades.pickaxe_level as i32)).max(MINE_TICK_MIN)
    }

    fn gravity(&self, jump_held: bool) -> f32 {
        if !self.is_airborne {
            return BASE_GRAVITY;
        }
        if self.velocity.y > 0.0 || !jump_held {
            BASE_GRAVITY * FALL_GRAVITY_SCALE
        } else if self.velocity.y.abs() < APEX_WINDOW {
            BASE_GRAVITY * APEX_GRAVITY_SCALE
        } else {
            BASE_GRAVITY
        }
    }

    /// One simulation step: input, integration, collision, selection.
    pub fn step(&mut self, ctx: &Rc<Ctx>, world: &mut World, dt: f32) {
        if self.is_dead {
            self.update_walk_cadence(ctx);
            return;
        }

        let (left, right, jump_held, jump_released, aim_up, aim_down) = {
            let input = ctx.input.borrow();
            (
                input.is_down(crate::input::Action::MoveLeft),
                input.is_down(crate::input::Action::MoveRight),
                input.is_down(crate::input::Action::Jump),
                input.is_released(crate::input::Action::Jump),
                input.is_down(crate::input::Action::AimUp),
                input.is_down(crate::input::Action::AimDown),
            )
        };

        self.is_moving = false;
        if left {
            self.position.x -= self.move_speed() * dt;
            self.facing_x = -1.0;
            self.is_moving = true;
        }
        if right {
            self.position.x += self.move_speed() * dt;
            self.facing_x = 1.0;
            self.is_moving = true;
        }

        self.mine_direction = if aim_down {
            MineDirection::Down
        } else if aim_up {
            MineDirection::Up
        } else {
            MineDirection::Horizontal
        };

        if jump_released {
            self.jump_latched = false;
        }
        if jump_held && !self.is_airborne && !self.jump_latched {
            self.velocity.y = -JUMP_SPEED;
            self.jump_latched = true;
            self.is_airborne = true;
            ctx.events.queue(GameEvent::PlayerJump);
        }

        self.velocity.y += self.gravity(jump_held) * dt;
        self.position.y += self.velocity.y * dt;

        self.resolve_against_world(ctx, world);
        self.update_walk_cadence(ctx);
    }

    fn resolve_against_world(&mut self, ctx: &Rc<Ctx>, world: &mut World) {
        let mut grounded = false;

        for id in world.ids_overlapping(self.collision_box()) {
            let Some(block) = world.get(id) else { continue };

            if block.kind.is_intangible() {
                if block.collision_box().overlaps(&self.collision_box()) {
                    ctx.events.queue(GameEvent::BlockClicked {
                        kind: block.kind,
                        position: block.position,
                    });
                }
                continue;
            }

            let bounds = self.collision_box();
            let block_bounds = block.collision_box();

            // Crushed by a falling block; only a grounded player can be
            // pinned under it. Checked before pushing out of the block so
            // a deep overlap still counts.
            if !self.is_airborne && !self.is_dead {
                if let Some(death_box) = block.death_box() {
                    if death_box.overlaps(&bounds) {
                        self.is_dead = true;
                        ctx.events.queue(GameEvent::PlayerDeath);
                    }
                }
            }

            if bounds.overlaps(&block_bounds) {
                let r = resolve_aabb(bounds, self.velocity.x, self.velocity.y, block_bounds);
                // A block below is not a floor while still moving upward
                let ignore = r.side == Side::Bottom && self.velocity.y < 0.0;
                if !ignore {
                    self.position = vec2(r.x - 4.0, r.y - 4.0);
                    self.velocity = vec2(r.vx, r.vy);
                    if r.side == Side::Bottom {
                        grounded = true;
                    }
                }
            }
        }

        let was_airborne = self.is_airborne;
        self.is_airborne = !grounded;
        if was_airborne && !self.is_airborne {
            ctx.events.queue(GameEvent::PlayerLand { position: self.position });
        }

        // Exactly one block selected, only while grounded
        world.clear_selection();
        if !self.is_airborne && !self.is_dead {
            let probe = self.probe_box();
            let target = world
                .ids_overlapping(probe)
                .into_iter()
                .find(|id| {
                    world
                        .get(*id)
                        .map(|b| !b.kind.is_intangible() && !b.is_airborne)
                        .unwrap_or(false)
                });
            if let Some(id) = target {
                if let Some(block) = world.get_mut(id) {
                    block.is_selected = true;
                }
            }
        }
    }

    /// Drive the mining timer from the current input and selection. Called
    /// once per step, after `step`, with the `Rc` handles the timer closure
    /// needs to capture.
    pub fn control_mining(ctx: &Rc<Ctx>, player: &Rc<RefCell<Player>>, world: &Rc<RefCell<World>>) {
        let interval;
        {
            let mut p = player.borrow_mut();
            let mut w = world.borrow_mut();
            let (mine_down, mine_released) = {
                let input = ctx.input.borrow();
                (
                    input.is_down(crate::input::Action::Mine),
                    input.is_released(crate::input::Action::Mine),
                )
            };

            let must_stop = mine_released || p.is_moving || p.is_dead || w.selected_id().is_none();
            if must_stop {
                if let Some(handle) = p.mining_timer.take() {
                    ctx.timers.cancel(handle);
                }
                for (_, block) in w.iter_mut() {
                    block.is_being_mined = false;
                }
            }

            // Mining cannot resume until the player stands still again
            if !mine_down || p.is_moving || p.is_dead {
                return;
            }
            let Some(selected) = w.selected_id() else { return };
            if let Some(block) = w.get_mut(selected) {
                if !block.kind.is_mineable() {
                    return;
                }
                block.is_being_mined = true;
            }
            if p.mining_timer.is_some() {
                return;
            }
            interval = p.mine_interval();
            if let Some(block) = w.get(selected) {
                ctx.events
                    .queue(GameEvent::PlayerStartMining { position: block.position });
            }
        }

        let ctx2 = Rc::clone(ctx);
        let player2 = Rc::clone(player);
        let world2 = Rc::clone(world);
        let handle = ctx.timers.schedule_repeating(interval, move || {
            let mut w = world2.borrow_mut();
            let mut p = player2.borrow_mut();
            let Some(id) = w.selected_id() else { return };
            let Some(block) = w.get_mut(id) else { return };
            if !block.is_being_mined {
                return;
            }
            let kind = block.kind;
            let position = block.position;
            let bounds = block.collision_box();
            let drop = block.mine(MINE_STRENGTH);
            let destroyed = block.should_destroy;

            ctx2.events.queue(GameEvent::BlockMined { kind, position });
            if destroyed {
                ctx2.events.queue(GameEvent::BlockDestroyed { kind, bounds });
            }
            if let Some((item, quantity)) = drop {
                p.add_item(&ctx2, item, quantity);
            }
        });
        player.borrow_mut().mining_timer = Some(handle);
    }

    /// Add a drop to the inventory, with the lucky charm rerolling the
    /// quantity. Persists and announces the pickup.
    pub fn add_item(&mut self, ctx: &Ctx, item: ItemKind, quantity: u32) {
        let quantity = if self.upgrades.lucky_charm {
            self.lucky_quantity()
        } else {
            quantity
        };
        *self.inventory.entry(item).or_insert(0) += quantity;
        ctx.save.borrow_mut().set(keys::INVENTORY, &self.inventory);
        ctx.events.queue(GameEvent::LogMessage {
            message: format!("+{} {}", quantity, item.label()),
        });
    }

    fn lucky_quantity(&mut self) -> u32 {
        let total: u32 = LUCKY_WEIGHTS.iter().map(|(_, w)| w).sum();
        let mut roll = self.rng.gen_range(0..total);
        for (quantity, weight) in LUCKY_WEIGHTS {
            if roll < weight {
                return quantity;
            }
            roll -= weight;
        }
        1
    }

    fn update_walk_cadence(&mut self, ctx: &Rc<Ctx>) {
        let should_walk = self.is_moving && !self.is_airborne && !self.is_dead;
        match (should_walk, self.walk_timer) {
            (true, None) => {
                let ctx2 = Rc::clone(ctx);
                let handle = ctx.timers.schedule_repeating(WALK_CADENCE, move || {
                    ctx2.events.queue(GameEvent::PlayerWalk);
                });
                self.walk_timer = Some(handle);
            }
            (false, Some(handle)) => {
                ctx.timers.cancel(handle);
                self.walk_timer = None;
            }
            _ => {}
        }
    }

    /// Cancel owned timers on scene teardown.
    pub fn cancel_timers(&mut self, ctx: &Ctx) {
        if let Some(handle) = self.mining_timer.take() {
            ctx.timers.cancel(handle);
        }
        if let Some(handle) = self.walk_timer.take() {
            ctx.timers.cancel(handle);
        }
    }

    pub fn draw(&mut self, ctx: &Ctx, sprite: Option<&Sprite>, dt: f32) {
        if self.is_dead {
            return;
        }
        let screen = {
            let camera = ctx.camera.borrow();
            screen_position(self.position, &camera)
        };

        match sprite {
            Some(sprite) => {
                let tag = match (self.is_airborne, self.is_moving, self.facing_x > 0.0) {
                    (true, _, true) => "fall-right",
                    (true, _, false) => "fall-left",
                    (false, true, true) => "run-right",
                    (false, true, false) => "run-left",
                    (false, false, true) => "idle-right",
                    (false, false, false) => "idle-left",
                };
                self.anim.draw(sprite, tag, screen.x, screen.y, dt, true);
            }
            None => {
                draw_rectangle(screen.x + 4.0, screen.y + 4.0, 8.0, 12.0, WHITE);
            }
        }

        debug_rect(ctx, self.collision_box(), DebugColor::Green);
        debug_rect(ctx, self.probe_box(), DebugColor::Yellow);
    }
}
