//! Time-based property tweens
//!
//! A tween animates one scalar property of one target from `from` to `to`
//! over a duration, through an easing curve. Tweens are keyed by
//! `(target, key)`: scheduling a new tween on the same key replaces the old
//! one, so re-triggered animations restart cleanly instead of fighting.
//!
//! On the update that crosses the end of a tween, the property snaps to the
//! exact end value before the completion callback runs.

use std::cell::{Cell, RefCell};

pub type EasingFn = fn(f32) -> f32;

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// The easing curves used across the game. All map [0,1] to [0,1] with
/// f(0)=0 and f(1)=1 (the back curves overshoot in between).
pub mod easing {
    pub fn linear(t: f32) -> f32 {
        t
    }

    pub fn ease_in_quad(t: f32) -> f32 {
        t * t
    }

    pub fn ease_out_quad(t: f32) -> f32 {
        1.0 - (1.0 - t) * (1.0 - t)
    }

    pub fn ease_in_out_quad(t: f32) -> f32 {
        if t < 0.5 {
            2.0 * t * t
        } else {
            1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
        }
    }

    pub fn ease_in_cubic(t: f32) -> f32 {
        t * t * t
    }

    pub fn ease_out_cubic(t: f32) -> f32 {
        1.0 - (1.0 - t).powi(3)
    }

    pub fn ease_in_out_cubic(t: f32) -> f32 {
        if t < 0.5 {
            4.0 * t * t * t
        } else {
            1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
        }
    }

    pub fn ease_out_quart(t: f32) -> f32 {
        1.0 - (1.0 - t).powi(4)
    }

    pub fn ease_out_back(t: f32) -> f32 {
        const C1: f32 = 1.70158;
        const C3: f32 = C1 + 1.0;
        1.0 + C3 * (t - 1.0).powi(3) + C1 * (t - 1.0).powi(2)
    }
}

thread_local! {
    static NEXT_TARGET: Cell<u64> = const { Cell::new(0) };
}

/// Identity of a tweenable object. Anything that wants tweened properties
/// holds one and passes it when scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TweenTarget(u64);

impl TweenTarget {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        NEXT_TARGET.with(|next| {
            let id = next.get();
            next.set(id + 1);
            TweenTarget(id)
        })
    }
}

struct Tween {
    target: TweenTarget,
    key: &'static str,
    from: f32,
    to: f32,
    duration: f32,
    elapsed: f32,
    easing: EasingFn,
    apply: Box<dyn FnMut(f32)>,
    on_complete: Option<Box<dyn FnOnce()>>,
}

pub struct Animator {
    active: RefCell<Vec<Tween>>,
}

impl Animator {
    pub fn new() -> Self {
        Self { active: RefCell::new(Vec::new()) }
    }

    /// Schedule a tween. An active tween on the same `(target, key)` is
    /// replaced. `apply` receives the current value every update.
    #[allow(clippy::too_many_arguments)]
    pub fn animate(
        &self,
        target: TweenTarget,
        key: &'static str,
        from: f32,
        to: f32,
        duration: f32,
        easing: EasingFn,
        apply: impl FnMut(f32) + 'static,
    ) {
        self.add(Tween {
            target,
            key,
            from,
            to,
            duration,
            elapsed: 0.0,
            easing,
            apply: Box::new(apply),
            on_complete: None,
        });
    }

    /// Like `animate`, with a callback fired once after the final snap.
    #[allow(clippy::too_many_arguments)]
    pub fn animate_with(
        &self,
        target: TweenTarget,
        key: &'static str,
        from: f32,
        to: f32,
        duration: f32,
        easing: EasingFn,
        apply: impl FnMut(f32) + 'static,
        on_complete: impl FnOnce() + 'static,
    ) {
        self.add(Tween {
            target,
            key,
            from,
            to,
            duration,
            elapsed: 0.0,
            easing,
            apply: Box::new(apply),
            on_complete: Some(Box::new(on_complete)),
        });
    }

    fn add(&self, tween: Tween) {
        let mut active = self.active.borrow_mut();
        active.retain(|t| !(t.target == tween.target && t.key == tween.key));
        active.push(tween);
    }

    /// Advance every tween. Completion callbacks run here and may schedule
    /// new tweens; a tween scheduled during a callback wins over a surviving
    /// tween on the same key.
    pub fn update(&self, dt: f32) {
        let tweens = self.active.take();
        let mut survivors = Vec::with_capacity(tweens.len());

        for mut tween in tweens {
            tween.elapsed += dt;
            if tween.elapsed <= tween.duration {
                let progress = (tween.easing)(tween.elapsed / tween.duration).min(1.0);
                let value = lerp(tween.from, tween.to, progress);
                (tween.apply)(value);
                survivors.push(tween);
            } else {
                (tween.apply)(tween.to);
                if let Some(done) = tween.on_complete.take() {
                    done();
                }
            }
        }

        let mut active = self.active.borrow_mut();
        let scheduled = std::mem::take(&mut *active);
        survivors.retain(|s| {
            !scheduled
                .iter()
                .any(|n| n.target == s.target && n.key == s.key)
        });
        survivors.extend(scheduled);
        *active = survivors;
    }

    pub fn is_animating(&self, target: TweenTarget, key: &'static str) -> bool {
        self.active
            .borrow()
            .iter()
            .any(|t| t.target == target && t.key == key)
    }

    pub fn reset(&self) {
        self.active.borrow_mut().clear();
    }
}

impl Default for Animator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn easing_endpoints_are_exact() {
        let curves: [EasingFn; 8] = [
            easing::linear,
            easing::ease_in_quad,
            easing::ease_out_quad,
            easing::ease_in_out_quad,
            easing::ease_in_cubic,
            easing::ease_out_cubic,
            easing::ease_in_out_cubic,
            easing::ease_out_quart,
        ];
        for f in curves {
            assert!((f(0.0)).abs() < 1e-6);
            assert!((f(1.0) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn tween_snaps_to_end_and_fires_completion() {
        let animator = Animator::new();
        let value = Rc::new(Cell::new(0.0f32));
        let done = Rc::new(Cell::new(false));
        let target = TweenTarget::new();

        {
            let value = Rc::clone(&value);
            let done = Rc::clone(&done);
            animator.animate_with(
                target,
                "x",
                0.0,
                10.0,
                1.0,
                easing::linear,
                move |v| value.set(v),
                move || done.set(true),
            );
        }

        animator.update(0.5);
        assert!((value.get() - 5.0).abs() < 1e-4);
        assert!(!done.get());
        assert!(animator.is_animating(target, "x"));

        // Overshoot the end: snap to exactly `to`, then complete
        animator.update(0.7);
        assert_eq!(value.get(), 10.0);
        assert!(done.get());
        assert!(!animator.is_animating(target, "x"));
    }

    #[test]
    fn same_key_replaces_previous_tween() {
        let animator = Animator::new();
        let value = Rc::new(Cell::new(0.0f32));
        let first_done = Rc::new(Cell::new(false));
        let target = TweenTarget::new();

        {
            let value = Rc::clone(&value);
            let first_done = Rc::clone(&first_done);
            animator.animate_with(
                target,
                "x",
                0.0,
                100.0,
                1.0,
                easing::linear,
                move |v| value.set(v),
                move || first_done.set(true),
            );
        }
        {
            let value = Rc::clone(&value);
            animator.animate(target, "x", 0.0, 10.0, 1.0, easing::linear, move |v| {
                value.set(v)
            });
        }

        animator.update(2.0);
        assert_eq!(value.get(), 10.0);
        // The replaced tween never completes
        assert!(!first_done.get());
    }

    #[test]
    fn different_keys_on_same_target_coexist() {
        let animator = Animator::new();
        let x = Rc::new(Cell::new(0.0f32));
        let y = Rc::new(Cell::new(0.0f32));
        let target = TweenTarget::new();

        {
            let x = Rc::clone(&x);
            animator.animate(target, "x", 0.0, 4.0, 1.0, easing::linear, move |v| x.set(v));
        }
        {
            let y = Rc::clone(&y);
            animator.animate(target, "y", 0.0, 8.0, 1.0, easing::linear, move |v| y.set(v));
        }

        animator.update(0.5);
        assert!((x.get() - 2.0).abs() < 1e-4);
        assert!((y.get() - 4.0).abs() < 1e-4);
    }

    #[test]
    fn completion_callback_may_schedule_followup() {
        let animator = Rc::new(Animator::new());
        let value = Rc::new(Cell::new(0.0f32));
        let target = TweenTarget::new();

        {
            let value = Rc::clone(&value);
            let animator2 = Rc::clone(&animator);
            let value2 = Rc::clone(&value);
            animator.animate_with(
                target,
                "x",
                0.0,
                1.0,
                0.1,
                easing::linear,
                move |v| value.set(v),
                move || {
                    let value = Rc::clone(&value2);
                    animator2.animate(target, "x", 1.0, 2.0, 0.1, easing::linear, move |v| {
                        value.set(v)
                    });
                },
            );
        }

        animator.update(0.2);
        assert!(animator.is_animating(target, "x"));
        animator.update(0.2);
        assert_eq!(value.get(), 2.0);
    }
}
