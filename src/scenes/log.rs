//! On-screen message log
//!
//! Short pickup and status messages ("+2 coal") that slide in above the
//! HUD, linger, then slide back out. Only one message shows at a time; a
//! new one replaces whatever is on screen.

use std::cell::RefCell;
use std::rc::Rc;

use macroquad::math::{vec2, Vec2};

use crate::animator::{easing, TweenTarget};
use crate::ctx::Ctx;
use crate::entity::Entity;
use crate::render::text::draw_bitmap_text;
use crate::timer::TimerHandle;

const SLIDE_DISTANCE: f32 = 20.0;
const SLIDE_IN_DURATION: f32 = 0.15;
const SLIDE_OUT_DURATION: f32 = 0.15;
const HOLD_DURATION: f32 = 2.5;

pub struct Log {
    /// Resting canvas position of the message baseline.
    origin: Vec2,
    position: Vec2,
    message: Option<String>,
    hold_timer: Option<TimerHandle>,
    tween_target: TweenTarget,
}

impl Log {
    pub fn new(origin: Vec2) -> Self {
        Self {
            origin,
            position: origin,
            message: None,
            hold_timer: None,
            tween_target: TweenTarget::new(),
        }
    }

    /// Replace whatever is showing and slide the new message in.
    pub fn show(ctx: &Rc<Ctx>, log: &Rc<RefCell<Log>>, message: String) {
        let (origin, target, old_timer) = {
            let mut log = log.borrow_mut();
            log.message = Some(message);
            log.position = log.origin + vec2(0.0, SLIDE_DISTANCE);
            (log.origin, log.tween_target, log.hold_timer.take())
        };
        if let Some(handle) = old_timer {
            ctx.timers.cancel(handle);
        }

        let apply = {
            let log = Rc::clone(log);
            move |y: f32| log.borrow_mut().position.y = y
        };
        ctx.animator.animate(
            target,
            "log-y",
            origin.y + SLIDE_DISTANCE,
            origin.y,
            SLIDE_IN_DURATION,
            easing::ease_out_back,
            apply,
        );

        let handle = ctx.timers.schedule_once(HOLD_DURATION, {
            let log = Rc::clone(log);
            let ctx = Rc::clone(ctx);
            move || {
                let apply = {
                    let log = Rc::clone(&log);
                    move |y: f32| log.borrow_mut().position.y = y
                };
                let done = {
                    let log = Rc::clone(&log);
                    move || {
                        let mut log = log.borrow_mut();
                        log.message = None;
                        log.hold_timer = None;
                    }
                };
                ctx.animator.animate_with(
                    target,
                    "log-y",
                    origin.y,
                    origin.y + SLIDE_DISTANCE,
                    SLIDE_OUT_DURATION,
                    easing::ease_in_quad,
                    apply,
                    done,
                );
            }
        });
        log.borrow_mut().hold_timer = Some(handle);
    }
}

impl Entity for Log {
    fn update(&mut self, _ctx: &Rc<Ctx>, _dt: f32) {}

    fn draw(&mut self, ctx: &Ctx, _dt: f32) {
        let Some(message) = &self.message else { return };
        let font = ctx.font.borrow();
        draw_bitmap_text(font.as_deref(), message, self.position.x, self.position.y, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::save::{MemoryBackend, SaveState};

    fn test_ctx() -> Rc<Ctx> {
        Ctx::new(SaveState::open(Box::new(MemoryBackend::default())))
    }

    #[test]
    fn message_slides_in_holds_then_clears() {
        let ctx = test_ctx();
        let log = Rc::new(RefCell::new(Log::new(vec2(160.0, 200.0))));
        Log::show(&ctx, &log, "+1 coal".into());

        assert_eq!(log.borrow().message.as_deref(), Some("+1 coal"));
        assert!(log.borrow().position.y > 200.0);

        ctx.animator.update(SLIDE_IN_DURATION + 0.01);
        assert!((log.borrow().position.y - 200.0).abs() < f32::EPSILON);

        ctx.timers.update(HOLD_DURATION + 0.01);
        ctx.animator.update(SLIDE_OUT_DURATION + 0.01);
        assert!(log.borrow().message.is_none());
    }

    #[test]
    fn new_message_replaces_the_old_one() {
        let ctx = test_ctx();
        let log = Rc::new(RefCell::new(Log::new(vec2(160.0, 200.0))));
        Log::show(&ctx, &log, "+1 coal".into());
        ctx.animator.update(SLIDE_IN_DURATION + 0.01);

        Log::show(&ctx, &log, "+2 iron".into());
        assert_eq!(log.borrow().message.as_deref(), Some("+2 iron"));

        // The first hold timer was cancelled, so nothing clears the new
        // message at the original deadline
        ctx.timers.update(HOLD_DURATION - 0.1);
        assert_eq!(log.borrow().message.as_deref(), Some("+2 iron"));
    }
}
