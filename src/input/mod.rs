//! Action-mapped input
//!
//! Gameplay code never asks about keys; it asks about actions. The state is
//! polled once per frame, keeping a previous-frame snapshot so pressed and
//! released edges can be queried anywhere without consuming anything.

use macroquad::input::{is_key_down, KeyCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft = 0,
    MoveRight,
    Jump,
    AimUp,
    AimDown,
    Mine,
    Confirm,
    MenuUp,
    MenuDown,
    Back,
    ToggleDebug,
}

impl Action {
    pub const ALL: [Action; 11] = [
        Action::MoveLeft,
        Action::MoveRight,
        Action::Jump,
        Action::AimUp,
        Action::AimDown,
        Action::Mine,
        Action::Confirm,
        Action::MenuUp,
        Action::MenuDown,
        Action::Back,
        Action::ToggleDebug,
    ];

    const COUNT: usize = Self::ALL.len();

    fn index(self) -> usize {
        self as usize
    }

    fn keys(self) -> &'static [KeyCode] {
        match self {
            Action::MoveLeft => &[KeyCode::A, KeyCode::Left],
            Action::MoveRight => &[KeyCode::D, KeyCode::Right],
            Action::Jump => &[KeyCode::Space],
            Action::AimUp => &[KeyCode::W, KeyCode::Up],
            Action::AimDown => &[KeyCode::S, KeyCode::Down],
            Action::Mine => &[KeyCode::E],
            Action::Confirm => &[KeyCode::Enter],
            Action::MenuUp => &[KeyCode::W, KeyCode::Up],
            Action::MenuDown => &[KeyCode::S, KeyCode::Down],
            Action::Back => &[KeyCode::Escape],
            Action::ToggleDebug => &[KeyCode::F3],
        }
    }
}

pub struct InputState {
    down: [bool; Action::COUNT],
    prev: [bool; Action::COUNT],
}

impl InputState {
    pub fn new() -> Self {
        Self { down: [false; Action::COUNT], prev: [false; Action::COUNT] }
    }

    /// Sample the keyboard. Call exactly once per frame, before any queries.
    pub fn poll(&mut self) {
        self.prev = self.down;
        for action in Action::ALL {
            self.down[action.index()] = action.keys().iter().any(|k| is_key_down(*k));
        }
    }

    /// Advance one frame from an explicit held-action set. Used by tests
    /// and anything else that drives input without a window.
    pub fn advance(&mut self, held: &[Action]) {
        self.prev = self.down;
        self.down = [false; Action::COUNT];
        for action in held {
            self.down[action.index()] = true;
        }
    }

    /// Clear press/release edges while keeping held state. Called between
    /// simulation substeps so an edge fires in exactly one step.
    pub fn settle(&mut self) {
        self.prev = self.down;
    }

    pub fn is_down(&self, action: Action) -> bool {
        self.down[action.index()]
    }

    /// Down this frame, up the previous frame.
    pub fn is_pressed(&self, action: Action) -> bool {
        self.down[action.index()] && !self.prev[action.index()]
    }

    /// Up this frame, down the previous frame.
    pub fn is_released(&self, action: Action) -> bool {
        !self.down[action.index()] && self.prev[action.index()]
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_and_release_edges_fire_once() {
        let mut input = InputState::new();

        input.advance(&[Action::Jump]);
        assert!(input.is_down(Action::Jump));
        assert!(input.is_pressed(Action::Jump));
        assert!(!input.is_released(Action::Jump));

        input.advance(&[Action::Jump]);
        assert!(input.is_down(Action::Jump));
        assert!(!input.is_pressed(Action::Jump));

        input.advance(&[]);
        assert!(!input.is_down(Action::Jump));
        assert!(input.is_released(Action::Jump));

        input.advance(&[]);
        assert!(!input.is_released(Action::Jump));
    }

    #[test]
    fn actions_are_independent() {
        let mut input = InputState::new();
        input.advance(&[Action::MoveLeft, Action::Mine]);
        assert!(input.is_down(Action::MoveLeft));
        assert!(input.is_down(Action::Mine));
        assert!(!input.is_down(Action::MoveRight));
    }
}
