//! Shared game context
//!
//! One `Ctx` is built in `main` and handed down by reference (as `Rc` where
//! callbacks need to capture it). It owns the cross-cutting collaborators:
//! event bus, animator, timers, particles, camera, input, save state, and
//! the draw queue. Scene-owned state (world, player, HUD entities) does not
//! live here.
//!
//! Everything is single-threaded; interior mutability covers the places
//! where event and timer callbacks need access while a scene is driving.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::animator::Animator;
use crate::camera::Camera;
use crate::events::EventBus;
use crate::input::InputState;
use crate::particles::Particles;
use crate::render::queue::DrawQueue;
use crate::render::sprite::Sprite;
use crate::save::SaveState;
use crate::timer::Timers;

pub struct Ctx {
    pub events: EventBus,
    pub animator: Animator,
    pub timers: Timers,
    pub particles: RefCell<Particles>,
    pub camera: RefCell<Camera>,
    pub input: RefCell<InputState>,
    pub save: RefCell<SaveState>,
    pub draws: DrawQueue,
    pub debug_draw: Cell<bool>,
    /// Default bitmap font; `None` falls back to built-in text.
    pub font: RefCell<Option<Rc<Sprite>>>,
}

impl Ctx {
    pub fn new(save: SaveState) -> Rc<Ctx> {
        Rc::new(Ctx {
            events: EventBus::new(),
            animator: Animator::new(),
            timers: Timers::new(),
            particles: RefCell::new(Particles::new()),
            camera: RefCell::new(Camera::new()),
            input: RefCell::new(InputState::new()),
            save: RefCell::new(save),
            draws: DrawQueue::new(),
            debug_draw: Cell::new(false),
            font: RefCell::new(None),
        })
    }

    pub fn set_font(&self, font: Rc<Sprite>) {
        *self.font.borrow_mut() = Some(font);
    }

    /// Scene-switch teardown. Subscriptions, timers, tweens, particles, and
    /// queued draws must never outlive the scene that created them.
    pub fn reset_scene_state(&self) {
        self.events.reset();
        self.timers.reset();
        self.animator.reset();
        self.particles.borrow_mut().reset();
        self.draws.clear();
        self.camera.borrow_mut().reset();
    }
}

thread_local! {
    static RNG_STREAM: Cell<u64> = const { Cell::new(0) };
}

/// Fresh rng seeded from wall time. A per-call stream counter keeps
/// instances created in the same instant from mirroring each other.
pub fn stream_rng() -> SmallRng {
    let stream = RNG_STREAM.with(|s| {
        let n = s.get();
        s.set(n.wrapping_add(1));
        n
    });
    let seed = macroquad::miniquad::date::now().to_bits()
        ^ stream.wrapping_mul(0x2545_f491_4f6c_dd1d);
    SmallRng::seed_from_u64(seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventKind, GameEvent};
    use crate::save::MemoryBackend;
    use std::cell::Cell as StdCell;

    fn test_ctx() -> Rc<Ctx> {
        Ctx::new(SaveState::open(Box::new(MemoryBackend::default())))
    }

    #[test]
    fn reset_clears_subscriptions_timers_and_tweens() {
        let ctx = test_ctx();
        let fired = Rc::new(StdCell::new(0));

        {
            let fired = Rc::clone(&fired);
            ctx.events
                .subscribe(EventKind::PlayerJump, move |_| fired.set(fired.get() + 1));
        }
        {
            let fired = Rc::clone(&fired);
            ctx.timers.schedule_once(0.1, move || fired.set(fired.get() + 1));
        }

        ctx.reset_scene_state();
        ctx.events.dispatch(&GameEvent::PlayerJump);
        ctx.timers.update(1.0);
        assert_eq!(fired.get(), 0);
        assert_eq!(ctx.particles.borrow().count(), 0);
    }

    #[test]
    fn stream_rngs_do_not_mirror_each_other() {
        use rand::Rng;
        let mut a = stream_rng();
        let mut b = stream_rng();
        let rolls_a: Vec<u32> = (0..20).map(|_| a.gen_range(0..1000)).collect();
        let rolls_b: Vec<u32> = (0..20).map(|_| b.gen_range(0..1000)).collect();
        assert_ne!(rolls_a, rolls_b);
    }
}
