//! Scenes
//!
//! One scene is active at a time and owns all gameplay state for its screen.
//! A scene asks for a switch by returning a `SceneRequest` from `update`;
//! the main loop tears the old scene down, resets the shared context, and
//! loads the next one.

pub mod death;
pub mod lantern;
pub mod log;
pub mod main_menu;
pub mod mine;
pub mod shop;
pub mod win;

use std::rc::Rc;

use crate::ctx::Ctx;

pub use death::DeathScene;
pub use main_menu::MainMenuScene;
pub use mine::MineScene;
pub use shop::ShopScene;
pub use win::WinScene;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneRequest {
    MainMenu,
    Mine,
    Shop,
    Death,
    Win,
}

pub enum ActiveScene {
    MainMenu(MainMenuScene),
    Mine(Box<MineScene>),
    Shop(ShopScene),
    Death(DeathScene),
    Win(WinScene),
}

impl ActiveScene {
    pub async fn load(request: SceneRequest, ctx: &Rc<Ctx>) -> ActiveScene {
        match request {
            SceneRequest::MainMenu => ActiveScene::MainMenu(MainMenuScene::new(ctx)),
            SceneRequest::Mine => ActiveScene::Mine(Box::new(MineScene::load(ctx).await)),
            SceneRequest::Shop => ActiveScene::Shop(ShopScene::load(ctx).await),
            SceneRequest::Death => ActiveScene::Death(DeathScene::load(ctx).await),
            SceneRequest::Win => ActiveScene::Win(WinScene::load(ctx).await),
        }
    }

    /// One fixed simulation step.
    pub fn update(&mut self, ctx: &Rc<Ctx>, dt: f32) -> Option<SceneRequest> {
        match self {
            ActiveScene::MainMenu(scene) => scene.update(ctx, dt),
            ActiveScene::Mine(scene) => scene.update(ctx, dt),
            ActiveScene::Shop(scene) => scene.update(ctx, dt),
            ActiveScene::Death(scene) => scene.update(ctx, dt),
            ActiveScene::Win(scene) => scene.update(ctx, dt),
        }
    }

    /// One render frame. `dt` is the smoothed frame delta for animations.
    pub fn draw(&mut self, ctx: &Ctx, dt: f32) {
        match self {
            ActiveScene::MainMenu(scene) => scene.draw(ctx, dt),
            ActiveScene::Mine(scene) => scene.draw(ctx, dt),
            ActiveScene::Shop(scene) => scene.draw(ctx, dt),
            ActiveScene::Death(scene) => scene.draw(ctx, dt),
            ActiveScene::Win(scene) => scene.draw(ctx, dt),
        }
    }

    /// Teardown before the context is reset for the next scene.
    pub fn destroy(&mut self, ctx: &Ctx) {
        if let ActiveScene::Mine(scene) = self {
            scene.destroy(ctx);
        }
    }
}
