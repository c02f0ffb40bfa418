//! The lantern
//!
//! The player's light source and the level timer made visible. The glow
//! shrinks through a fixed ladder of sizes as level time burns down; when
//! the ladder runs out the screen is fully dark and the scene calls the run.
//!
//! Size changes are announced on the bus and applied after a short delay,
//! so the flame audibly gutters before the light actually steps down.

use std::rc::Rc;

use macroquad::color::BLACK;
use macroquad::math::{vec2, Vec2};
use macroquad::shapes::draw_rectangle;

use crate::animator::{easing, lerp, TweenTarget};
use crate::camera::{VIEW_HEIGHT, VIEW_WIDTH};
use crate::ctx::Ctx;
use crate::entity::{screen_position, Entity};
use crate::events::GameEvent;
use crate::player::MineDirection;
use crate::render::sprite::Sprite;

/// Glow frames from full light to darkness. `None` is lights out.
const SIZES: [Option<&str>; 11] = [
    Some("0"),
    Some("0"),
    Some("0"),
    Some("1"),
    Some("1"),
    Some("2"),
    Some("3"),
    Some("4"),
    Some("4"),
    Some("5"),
    None,
];

/// How fast the glow chases the player, fraction per update.
const FOLLOW_RATE: f32 = 0.15;
const SHAKE_REROLL: f32 = 0.05;
/// Intro flare: the lantern is lit and settles before full brightness.
const INTRO_FROM: f32 = 9.0;
const INTRO_TO: f32 = 2.0;
const INTRO_DURATION: f32 = 2.0;

/// Where the player is and where they are aiming, snapshotted per step.
#[derive(Debug, Clone, Copy)]
pub struct PlayerPose {
    pub position: Vec2,
    pub facing_x: f32,
    pub mine_direction: MineDirection,
}

pub struct Lantern {
    pub position: Vec2,
    sprite: Option<Rc<Sprite>>,
    current_size_index: usize,
    announced_size_index: usize,
    /// Remaining level time over maximum, set by the scene every step.
    time_fraction: f32,
    intro_done: bool,
    shake_magnitude: Vec2,
    shake_offset: Vec2,
    shake_cadence: f32,
    shaking: bool,
    pose: PlayerPose,
    pub tween_target: TweenTarget,
    rng: rand::rngs::SmallRng,
}

impl Lantern {
    pub fn new(start: Vec2, sprite: Option<Rc<Sprite>>) -> Self {
        Self {
            position: start,
            sprite,
            current_size_index: INTRO_FROM as usize,
            announced_size_index: 0,
            time_fraction: 1.0,
            intro_done: false,
            shake_magnitude: Vec2::ZERO,
            shake_offset: Vec2::ZERO,
            shake_cadence: 0.0,
            shaking: false,
            pose: PlayerPose {
                position: start,
                facing_x: 1.0,
                mine_direction: MineDirection::Horizontal,
            },
            tween_target: TweenTarget::new(),
            rng: crate::ctx::stream_rng(),
        }
    }

    /// Flare the light open, then settle to full brightness.
    pub fn play_intro(ctx: &Ctx, lantern: &Rc<std::cell::RefCell<Lantern>>) {
        let target = lantern.borrow().tween_target;
        let apply = {
            let lantern = Rc::clone(lantern);
            move |v: f32| lantern.borrow_mut().current_size_index = v.round().max(0.0) as usize
        };
        let done = {
            let lantern = Rc::clone(lantern);
            move || {
                let mut lantern = lantern.borrow_mut();
                lantern.current_size_index = 0;
                lantern.announced_size_index = 0;
                lantern.intro_done = true;
            }
        };
        ctx.animator.animate_with(
            target,
            "size-index",
            INTRO_FROM,
            INTRO_TO,
            INTRO_DURATION,
            easing::ease_in_out_cubic,
            apply,
            done,
        );
    }

    pub fn set_time_fraction(&mut self, fraction: f32) {
        self.time_fraction = fraction.clamp(0.0, 1.0);
    }

    pub fn set_pose(&mut self, pose: PlayerPose) {
        self.pose = pose;
    }

    pub fn start_shake(&mut self, magnitude: Vec2) {
        self.shake_magnitude = magnitude;
        self.shaking = true;
        self.shake_cadence = 0.0;
    }

    pub fn stop_shake(&mut self) {
        self.shaking = false;
        self.shake_offset = Vec2::ZERO;
    }

    /// Step the glow ladder in (applied by the scene after the gutter
    /// delay).
    pub fn apply_size_index(&mut self, size_index: usize) {
        self.current_size_index = size_index.min(SIZES.len() - 1);
    }

    pub fn is_dark(&self) -> bool {
        SIZES[self.current_size_index.min(SIZES.len() - 1)].is_none()
    }

    fn target_position(&self) -> Vec2 {
        // The glow leads slightly toward where the player is working
        let lead = match self.pose.mine_direction {
            MineDirection::Up => vec2(0.0, -10.0),
            MineDirection::Down => vec2(0.0, 10.0),
            MineDirection::Horizontal => vec2(8.0 * self.pose.facing_x, 0.0),
        };
        self.pose.position + vec2(8.0, 8.0) + lead
    }
}

impl Entity for Lantern {
    fn update(&mut self, ctx: &Rc<Ctx>, dt: f32) {
        let target = self.target_position();
        self.position += (target - self.position) * FOLLOW_RATE;

        if self.shaking {
            self.shake_cadence -= dt;
            if self.shake_cadence <= 0.0 {
                use rand::Rng;
                self.shake_cadence = SHAKE_REROLL;
                let m = self.shake_magnitude;
                self.shake_offset = vec2(
                    if m.x > 0.0 { self.rng.gen_range(-m.x..=m.x) } else { 0.0 },
                    if m.y > 0.0 { self.rng.gen_range(-m.y..=m.y) } else { 0.0 },
                );
            }
        }

        if self.intro_done {
            let ladder = (SIZES.len() - 1) as f32;
            let stepped =
                lerp(ladder, 0.0, self.time_fraction).floor().clamp(0.0, ladder) as usize;
            if stepped != self.announced_size_index {
                self.announced_size_index = stepped;
                ctx.events
                    .queue(GameEvent::LanternSizeChange { size_index: stepped });
            }
        }
    }

    fn draw(&mut self, ctx: &Ctx, _dt: f32) {
        let frame = SIZES[self.current_size_index.min(SIZES.len() - 1)];

        let Some(frame) = frame else {
            draw_rectangle(0.0, 0.0, VIEW_WIDTH, VIEW_HEIGHT, BLACK);
            return;
        };

        // No lantern art: keep the world visible rather than guessing at a
        // vignette
        let Some(sprite) = self.sprite.clone() else { return };

        let camera = ctx.camera.borrow();
        let center = screen_position(self.position + self.shake_offset, &camera);
        let size = sprite.frame_size(frame).unwrap_or(vec2(128.0, 128.0));
        let top_left = (center - size / 2.0).round();

        sprite.draw_frame(frame, top_left.x, top_left.y);

        // Black out everything beyond the glow frame
        draw_rectangle(0.0, 0.0, VIEW_WIDTH, top_left.y, BLACK);
        draw_rectangle(0.0, top_left.y + size.y, VIEW_WIDTH, VIEW_HEIGHT, BLACK);
        draw_rectangle(0.0, top_left.y, top_left.x, size.y, BLACK);
        draw_rectangle(top_left.x + size.x, top_left.y, VIEW_WIDTH, size.y, BLACK);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ctx::Ctx;
    use crate::events::{EventKind, GameEvent};
    use crate::save::{MemoryBackend, SaveState};
    use std::cell::RefCell;

    fn test_ctx() -> Rc<Ctx> {
        Ctx::new(SaveState::open(Box::new(MemoryBackend::default())))
    }

    #[test]
    fn intro_settles_to_full_brightness() {
        let ctx = test_ctx();
        let lantern = Rc::new(RefCell::new(Lantern::new(Vec2::ZERO, None)));
        Lantern::play_intro(&ctx, &lantern);

        ctx.animator.update(INTRO_DURATION + 0.1);
        let lantern = lantern.borrow();
        assert_eq!(lantern.current_size_index, 0);
        assert!(lantern.intro_done);
        assert!(!lantern.is_dark());
    }

    #[test]
    fn burning_down_announces_size_steps_until_dark() {
        let ctx = test_ctx();
        let announced = Rc::new(RefCell::new(Vec::new()));
        {
            let announced = Rc::clone(&announced);
            ctx.events.subscribe(EventKind::LanternSizeChange, move |e| {
                if let GameEvent::LanternSizeChange { size_index } = e {
                    announced.borrow_mut().push(*size_index);
                }
            });
        }

        let mut lantern = Lantern::new(Vec2::ZERO, None);
        lantern.intro_done = true;

        for i in 0..=10 {
            lantern.set_time_fraction(1.0 - i as f32 / 10.0);
            lantern.update(&ctx, 1.0 / 60.0);
            ctx.events.flush();
        }

        let announced = announced.borrow();
        assert_eq!(*announced, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);

        lantern.apply_size_index(10);
        assert!(lantern.is_dark());
    }

    #[test]
    fn glow_chases_the_player() {
        let ctx = test_ctx();
        let mut lantern = Lantern::new(Vec2::ZERO, None);
        lantern.set_pose(PlayerPose {
            position: vec2(200.0, 100.0),
            facing_x: 1.0,
            mine_direction: MineDirection::Horizontal,
        });
        for _ in 0..300 {
            lantern.update(&ctx, 1.0 / 60.0);
        }
        // Settles on the lead position: player center plus facing lead
        assert!((lantern.position.x - 216.0).abs() < 0.5);
        assert!((lantern.position.y - 108.0).abs() < 0.5);
    }
}
