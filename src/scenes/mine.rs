//! The mine
//!
//! Owns the world, the player, the lantern, and the HUD for a single
//! descent. Gameplay modules communicate over the event bus; this scene
//! wires the subscribers that turn those events into sound, particles,
//! camera shake, and scene switches.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use macroquad::color::{Color, BLACK, WHITE};
use macroquad::logging::{error, warn};
use macroquad::math::{vec2, Vec2};
use macroquad::shapes::{draw_rectangle, draw_rectangle_lines};

use crate::audio::{Cue, SoundBank};
use crate::camera::{VIEW_HEIGHT, VIEW_WIDTH};
use crate::ctx::Ctx;
use crate::entity::Entity;
use crate::events::{EventKind, GameEvent};
use crate::particles::{DestroyBurstEmitter, FallDustEmitter, MineSparkEmitter};
use crate::physics::Aabb;
use crate::player::Player;
use crate::render::debug::{debug_rect, DebugColor};
use crate::render::sprite::Sprite;
use crate::render::text::draw_bitmap_text;
use crate::save::keys;
use crate::scenes::lantern::{Lantern, PlayerPose};
use crate::scenes::log::Log;
use crate::scenes::SceneRequest;
use crate::world::level::{builtin_levels, parse_level, LevelData, LevelMeta, CELL_SIZE};
use crate::world::{BlockId, BlockKind, World};

/// Each lantern upgrade stretches the level clock by a quarter.
const LANTERN_TIME_SCALE: f32 = 0.25;
const CAMERA_FOLLOW_RATE: f32 = 0.1;
const DEATH_SCENE_DELAY: f32 = 1.0;
/// The flame gutters audibly before the glow actually steps down.
const SIZE_STEP_DELAY: f32 = 0.5;

type DustFlags = Rc<RefCell<HashMap<BlockId, Rc<Cell<bool>>>>>;

pub struct MineScene {
    world: Rc<RefCell<World>>,
    player: Rc<RefCell<Player>>,
    lantern: Rc<RefCell<Lantern>>,
    log: Rc<RefCell<Log>>,
    pending: Rc<RefCell<Option<SceneRequest>>>,
    dust_flags: DustFlags,
    sounds: Rc<SoundBank>,
    player_sprite: Option<Rc<Sprite>>,
    blocks_sprite: Option<Rc<Sprite>>,
    level_index: usize,
    level_time: f32,
    max_level_time: f32,
    time_expired: bool,
}

impl MineScene {
    pub async fn load(ctx: &Rc<Ctx>) -> MineScene {
        let levels = builtin_levels();
        let saved_index = ctx.save.borrow().get_or(keys::LEVEL_INDEX, 0usize);
        let level_index = saved_index.min(levels.len() - 1);

        let level = match parse_level(levels[level_index]) {
            Ok(level) => level,
            Err(e) => {
                error!("level {} failed to load: {}", level_index + 1, e);
                fallback_level()
            }
        };

        let world = World::from_level(&level);
        let player = Player::new(world.player_start, &ctx.save.borrow());

        let lantern_level = ctx.save.borrow().get_or(keys::LANTERN_LEVEL, 0u32);
        let max_level_time =
            level.meta.base_level_time_in_seconds * (1.0 + LANTERN_TIME_SCALE * lantern_level as f32);

        let player_sprite = load_sprite("assets/sprites/player.png", "assets/sprites/player-sprite.json").await;
        let blocks_sprite = load_sprite("assets/sprites/blocks.png", "assets/sprites/blocks-sprite.json").await;
        let lantern_sprite = load_sprite("assets/sprites/lantern.png", "assets/sprites/lantern-sprite.json").await;
        let sounds = Rc::new(SoundBank::load().await);

        let player_center = player.collision_box().center();
        ctx.camera.borrow_mut().snap_to(player_center);

        let lantern = Rc::new(RefCell::new(Lantern::new(player_center, lantern_sprite)));
        Lantern::play_intro(ctx, &lantern);

        let scene = MineScene {
            world: Rc::new(RefCell::new(world)),
            player: Rc::new(RefCell::new(player)),
            lantern,
            log: Rc::new(RefCell::new(Log::new(vec2(VIEW_WIDTH / 2.0, VIEW_HEIGHT - 32.0)))),
            pending: Rc::new(RefCell::new(None)),
            dust_flags: Rc::new(RefCell::new(HashMap::new())),
            sounds,
            player_sprite,
            blocks_sprite,
            level_index,
            level_time: max_level_time,
            max_level_time,
            time_expired: false,
        };
        scene.wire_events(ctx);
        scene
    }

    /// Subscribe every cross-cutting reaction. Subscribers run at flush
    /// time, when nothing holds a borrow on the world or the player.
    fn wire_events(&self, ctx: &Rc<Ctx>) {
        let sounds = Rc::clone(&self.sounds);

        {
            let ctx2 = Rc::clone(ctx);
            let world = Rc::clone(&self.world);
            let sounds = Rc::clone(&sounds);
            ctx.events.subscribe(EventKind::BlockMined, move |event| {
                let GameEvent::BlockMined { position, .. } = event else { return };
                let origin = *position + vec2(CELL_SIZE / 2.0, CELL_SIZE / 2.0);
                let boxes = solid_boxes_near(&world.borrow(), origin);
                let sparks = MineSparkEmitter::new(origin, boxes, 1.0, 1.0);
                ctx2.particles.borrow_mut().add(Box::new(sparks));
                sounds.play(Cue::MineTick);
            });
        }
        {
            let ctx2 = Rc::clone(ctx);
            let world = Rc::clone(&self.world);
            let sounds = Rc::clone(&sounds);
            ctx.events.subscribe(EventKind::BlockDestroyed, move |event| {
                let GameEvent::BlockDestroyed { bounds, .. } = event else { return };
                let world = world.borrow();
                let boxes = solid_boxes_near(&world, bounds.center());
                let burst = DestroyBurstEmitter::new(*bounds, boxes, world.death_boxes());
                ctx2.particles.borrow_mut().add(Box::new(burst));
                sounds.play(Cue::BlockDestroy);
            });
        }
        {
            let ctx2 = Rc::clone(ctx);
            let dust_flags = Rc::clone(&self.dust_flags);
            ctx.events.subscribe(EventKind::BlockStartFall, move |event| {
                let GameEvent::BlockStartFall { id, position } = event else { return };
                let active = Rc::new(Cell::new(true));
                dust_flags.borrow_mut().insert(*id, Rc::clone(&active));
                let source = Aabb::new(position.x, position.y, CELL_SIZE, CELL_SIZE);
                ctx2.particles
                    .borrow_mut()
                    .add(Box::new(FallDustEmitter::new(source, active)));
            });
        }
        {
            let ctx2 = Rc::clone(ctx);
            let dust_flags = Rc::clone(&self.dust_flags);
            let sounds = Rc::clone(&sounds);
            ctx.events.subscribe(EventKind::BlockLanded, move |event| {
                let GameEvent::BlockLanded { id, .. } = event else { return };
                if let Some(flag) = dust_flags.borrow_mut().remove(id) {
                    flag.set(false);
                }
                sounds.play(Cue::BlockLand);
                ctx2.camera.borrow_mut().shake(vec2(0.0, 3.0), 0.2);
                ctx2.events.queue(GameEvent::LanternShake {
                    magnitude: vec2(1.0, 1.0),
                    duration: 0.3,
                });
            });
        }
        {
            let ctx2 = Rc::clone(ctx);
            let pending = Rc::clone(&self.pending);
            let sounds = Rc::clone(&sounds);
            let level_index = self.level_index;
            ctx.events.subscribe(EventKind::BlockClicked, move |event| {
                let GameEvent::BlockClicked { kind, .. } = event else { return };
                if pending.borrow().is_some() {
                    return;
                }
                match kind {
                    BlockKind::Exit => {
                        ctx2.save.borrow_mut().set(keys::LEVEL_INDEX, level_index + 1);
                        sounds.play(Cue::Select);
                        *pending.borrow_mut() = Some(SceneRequest::Shop);
                    }
                    BlockKind::Chest => {
                        sounds.play(Cue::Select);
                        *pending.borrow_mut() = Some(SceneRequest::Win);
                    }
                    _ => {}
                }
            });
        }
        {
            let sounds = Rc::clone(&sounds);
            ctx.events
                .subscribe(EventKind::PlayerJump, move |_| sounds.play(Cue::Jump));
        }
        {
            let sounds = Rc::clone(&sounds);
            ctx.events
                .subscribe(EventKind::PlayerWalk, move |_| sounds.play(Cue::Walk));
        }
        {
            let sounds = Rc::clone(&sounds);
            ctx.events
                .subscribe(EventKind::PlayerLand, move |_| sounds.play(Cue::Land));
        }
        {
            let ctx2 = Rc::clone(ctx);
            let player = Rc::clone(&self.player);
            let pending = Rc::clone(&self.pending);
            let sounds = Rc::clone(&sounds);
            let handled = Cell::new(false);
            ctx.events.subscribe(EventKind::PlayerDeath, move |_| {
                if handled.replace(true) {
                    return;
                }
                player.borrow_mut().is_dead = true;
                sounds.play(Cue::Death);
                let pending = Rc::clone(&pending);
                ctx2.timers.schedule_once(DEATH_SCENE_DELAY, move || {
                    *pending.borrow_mut() = Some(SceneRequest::Death);
                });
            });
        }
        {
            let ctx2 = Rc::clone(ctx);
            let log = Rc::clone(&self.log);
            ctx.events.subscribe(EventKind::LogMessage, move |event| {
                let GameEvent::LogMessage { message } = event else { return };
                Log::show(&ctx2, &log, message.clone());
            });
        }
        {
            let ctx2 = Rc::clone(ctx);
            let lantern = Rc::clone(&self.lantern);
            ctx.events.subscribe(EventKind::LanternShake, move |event| {
                let GameEvent::LanternShake { magnitude, duration } = event else { return };
                lantern.borrow_mut().start_shake(*magnitude);
                let lantern = Rc::clone(&lantern);
                ctx2.timers.schedule_once(*duration, move || {
                    lantern.borrow_mut().stop_shake();
                });
            });
        }
        {
            let ctx2 = Rc::clone(ctx);
            let lantern = Rc::clone(&self.lantern);
            let sounds = Rc::clone(&sounds);
            ctx.events.subscribe(EventKind::LanternSizeChange, move |event| {
                let GameEvent::LanternSizeChange { size_index } = event else { return };
                sounds.play(Cue::Extinguish);
                let lantern = Rc::clone(&lantern);
                let size_index = *size_index;
                ctx2.timers.schedule_once(SIZE_STEP_DELAY, move || {
                    lantern.borrow_mut().apply_size_index(size_index);
                });
            });
        }
    }

    pub fn update(&mut self, ctx: &Rc<Ctx>, dt: f32) -> Option<SceneRequest> {
        if !self.time_expired {
            self.level_time -= dt;
            if self.level_time <= 0.0 {
                self.level_time = 0.0;
                self.time_expired = true;
                ctx.events.queue(GameEvent::PlayerDeath);
            }
        }

        {
            let mut world = self.world.borrow_mut();
            let mut player = self.player.borrow_mut();
            player.step(ctx, &mut world, dt);
        }
        ctx.events.flush();

        Player::control_mining(ctx, &self.player, &self.world);
        ctx.events.flush();

        {
            let mut world = self.world.borrow_mut();
            let transitions = world.update(dt);
            for id in transitions.started_falling {
                if let Some(block) = world.get(id) {
                    ctx.events.queue(GameEvent::BlockStartFall { id, position: block.position });
                }
            }
            for id in transitions.landed {
                if let Some(block) = world.get(id) {
                    ctx.events.queue(GameEvent::BlockLanded { id, position: block.position });
                }
            }
            for block in world.sweep_destroyed() {
                ctx.events.queue(GameEvent::BlockDestroyed {
                    kind: block.kind,
                    bounds: block.collision_box(),
                });
            }
        }
        ctx.events.flush();

        {
            let player = self.player.borrow();
            let mut lantern = self.lantern.borrow_mut();
            lantern.set_pose(PlayerPose {
                position: player.position,
                facing_x: player.facing_x,
                mine_direction: player.mine_direction,
            });
            lantern.set_time_fraction(self.level_time / self.max_level_time);
        }
        self.lantern.borrow_mut().update(ctx, dt);
        self.log.borrow_mut().update(ctx, dt);
        ctx.events.flush();

        {
            let target = self.player.borrow().collision_box().center();
            ctx.camera.borrow_mut().follow(target, CAMERA_FOLLOW_RATE);
        }

        self.pending.borrow_mut().take()
    }

    pub fn draw(&mut self, ctx: &Ctx, dt: f32) {
        self.draw_blocks(ctx);

        {
            let camera = ctx.camera.borrow();
            ctx.particles.borrow().draw(&camera);
        }

        self.player
            .borrow_mut()
            .draw(ctx, self.player_sprite.as_deref(), dt);

        // Darkness goes over the world, HUD text stays readable on top
        self.lantern.borrow_mut().draw(ctx, dt);
        self.log.borrow_mut().draw(ctx, dt);
        self.draw_hud(ctx);
    }

    fn draw_blocks(&self, ctx: &Ctx) {
        let camera = ctx.camera.borrow();
        let (min, max) = camera.visible(CELL_SIZE);
        let world = self.world.borrow();

        for (_, block) in world.iter() {
            if block.position.x < min.x
                || block.position.x > max.x
                || block.position.y < min.y
                || block.position.y > max.y
            {
                continue;
            }

            let screen = camera.world_to_screen(block.position);
            match &self.blocks_sprite {
                Some(sprite) => sprite.draw_frame(block.kind.frame_name(), screen.x, screen.y),
                None => draw_rectangle(
                    screen.x,
                    screen.y,
                    CELL_SIZE,
                    CELL_SIZE,
                    block.kind.fallback_color(),
                ),
            }

            if block.is_selected {
                draw_rectangle_lines(screen.x, screen.y, CELL_SIZE, CELL_SIZE, 1.0, WHITE);
            }

            let fraction = block.durability_fraction();
            if fraction < 1.0 {
                let bar_w = CELL_SIZE - 8.0;
                draw_rectangle(screen.x + 4.0, screen.y + 2.0, bar_w, 2.0, BLACK);
                draw_rectangle(
                    screen.x + 4.0,
                    screen.y + 2.0,
                    bar_w * fraction,
                    2.0,
                    Color::from_rgba(240, 210, 90, 255),
                );
            }

            debug_rect(ctx, block.collision_box(), DebugColor::Blue);
            if let Some(death_box) = block.death_box() {
                debug_rect(ctx, death_box, DebugColor::Red);
            }
        }
    }

    fn draw_hud(&self, ctx: &Ctx) {
        let font = ctx.font.borrow();
        let font = font.as_deref();
        let gold = ctx.save.borrow().get_or(keys::GOLD, 0u32);

        draw_bitmap_text(font, &format!("depth {}", self.level_index + 1), 4.0, 4.0, false);
        draw_bitmap_text(font, &format!("gold {}", gold), 4.0, 14.0, false);
        draw_bitmap_text(
            font,
            &format!("{:>3}", self.level_time.ceil() as u32),
            VIEW_WIDTH - 24.0,
            4.0,
            false,
        );
    }

    pub fn destroy(&mut self, ctx: &Ctx) {
        self.player.borrow_mut().cancel_timers(ctx);
    }
}

async fn load_sprite(image_path: &str, data_path: &str) -> Option<Rc<Sprite>> {
    match Sprite::load(image_path, data_path).await {
        Ok(sprite) => Some(Rc::new(sprite)),
        Err(e) => {
            warn!("sprite '{}' unavailable: {}", image_path, e);
            None
        }
    }
}

/// Collision boxes of tangible blocks around a point, for particle bounce.
fn solid_boxes_near(world: &World, around: Vec2) -> Vec<Aabb> {
    let region = Aabb::new(around.x - 48.0, around.y - 48.0, 96.0, 96.0);
    world
        .ids_overlapping(region)
        .into_iter()
        .filter_map(|id| world.get(id))
        .filter(|block| !block.kind.is_intangible())
        .map(|block| block.collision_box())
        .collect()
}

fn fallback_level() -> LevelData {
    LevelData {
        meta: LevelMeta { width: 3, height: 3, base_level_time_in_seconds: 60.0 },
        blocks: vec![9, 9, 9, 9, -1, 9, 9, 9, 9],
    }
}
