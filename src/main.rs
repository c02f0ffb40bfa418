//! DEEPLIGHT: a mining descent lit by a dying lantern
//!
//! A 320x240 canvas scaled to the window, a fixed-step simulation, and one
//! active scene at a time. Dig down before the light runs out, sell what
//! you find, buy a brighter lantern, descend again.

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod animator;
mod audio;
mod camera;
mod clock;
mod ctx;
mod economy;
mod entity;
mod events;
mod input;
mod particles;
mod physics;
mod player;
mod render;
mod save;
mod scenes;
mod timer;
mod world;

use std::rc::Rc;

use macroquad::logging::warn;
use macroquad::prelude::{get_frame_time, next_frame, Conf};

use camera::{VIEW_HEIGHT, VIEW_WIDTH};
use clock::FrameClock;
use ctx::Ctx;
use input::Action;
use render::canvas::Canvas;
use render::sprite::Sprite;
use save::{default_backend, SaveState};
use scenes::{ActiveScene, SceneRequest};

fn window_conf() -> Conf {
    Conf {
        window_title: format!("DEEPLIGHT v{}", VERSION),
        window_width: 960,
        window_height: 720,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let save = SaveState::open(default_backend());
    let ctx = Ctx::new(save);
    let canvas = Canvas::new(VIEW_WIDTH as u32, VIEW_HEIGHT as u32);

    match Sprite::load("assets/sprites/font.png", "assets/sprites/font-sprite.json").await {
        Ok(font) => ctx.set_font(Rc::new(font)),
        Err(e) => warn!("bitmap font unavailable, using fallback text: {}", e),
    }

    let mut clock = FrameClock::new();
    let mut scene = ActiveScene::load(SceneRequest::MainMenu, &ctx).await;

    loop {
        let frame = clock.tick(get_frame_time());

        ctx.input.borrow_mut().poll();
        if ctx.input.borrow().is_pressed(Action::ToggleDebug) {
            ctx.debug_draw.set(!ctx.debug_draw.get());
        }

        let mut request = None;
        for _ in 0..frame.steps {
            if request.is_none() {
                request = scene.update(&ctx, frame.step_dt);
            }
            ctx.timers.update(frame.step_dt);
            ctx.events.flush();
            ctx.input.borrow_mut().settle();
        }

        ctx.animator.update(frame.delta);
        ctx.camera.borrow_mut().update(frame.delta);
        ctx.particles.borrow_mut().update(frame.delta);
        ctx.events.flush();

        canvas.begin();
        scene.draw(&ctx, frame.smoothed);
        ctx.draws.flush(ctx.debug_draw.get());
        canvas.end();

        if let Some(request) = request {
            scene.destroy(&ctx);
            ctx.reset_scene_state();
            scene = ActiveScene::load(request, &ctx).await;
        }

        next_frame().await;
    }
}
