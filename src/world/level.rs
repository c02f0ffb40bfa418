//! Level data
//!
//! Levels are JSON: dimensions plus a flat row-major array of cell codes.
//! `0` is air, `-1` the player start, positive codes are block kinds.
//! Parsing validates against hard limits before any world is built, so a
//! malformed file fails loudly at load time instead of strangely at play
//! time.

use macroquad::math::{vec2, Vec2};
use serde::Deserialize;
use std::fmt;

use super::block::BlockKind;

/// Side of one grid cell in world pixels.
pub const CELL_SIZE: f32 = 32.0;

pub const PLAYER_START_CODE: i32 = -1;
pub const AIR_CODE: i32 = 0;

/// Validation limits for level files.
pub mod limits {
    pub const MAX_WIDTH: usize = 256;
    pub const MAX_HEIGHT: usize = 512;
    pub const MIN_LEVEL_TIME: f32 = 1.0;
    pub const MAX_LEVEL_TIME: f32 = 3600.0;
}

#[derive(Debug, Clone, Deserialize)]
pub struct LevelMeta {
    pub width: usize,
    pub height: usize,
    #[serde(rename = "baseLevelTimeInSeconds")]
    pub base_level_time_in_seconds: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LevelData {
    pub meta: LevelMeta,
    pub blocks: Vec<i32>,
}

#[derive(Debug)]
pub enum LevelError {
    Parse(serde_json::Error),
    Validation(String),
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelError::Parse(e) => write!(f, "level is not valid JSON: {}", e),
            LevelError::Validation(msg) => write!(f, "invalid level: {}", msg),
        }
    }
}

impl From<serde_json::Error> for LevelError {
    fn from(e: serde_json::Error) -> Self {
        LevelError::Parse(e)
    }
}

/// Parse and validate a level file.
pub fn parse_level(json: &str) -> Result<LevelData, LevelError> {
    let level: LevelData = serde_json::from_str(json)?;
    validate(&level).map_err(LevelError::Validation)?;
    Ok(level)
}

fn validate(level: &LevelData) -> Result<(), String> {
    let meta = &level.meta;
    if meta.width == 0 || meta.width > limits::MAX_WIDTH {
        return Err(format!(
            "width {} out of range 1..={}",
            meta.width,
            limits::MAX_WIDTH
        ));
    }
    if meta.height == 0 || meta.height > limits::MAX_HEIGHT {
        return Err(format!(
            "height {} out of range 1..={}",
            meta.height,
            limits::MAX_HEIGHT
        ));
    }
    if !(limits::MIN_LEVEL_TIME..=limits::MAX_LEVEL_TIME).contains(&meta.base_level_time_in_seconds)
    {
        return Err(format!(
            "level time {} out of range",
            meta.base_level_time_in_seconds
        ));
    }
    let expected = meta.width * meta.height;
    if level.blocks.len() != expected {
        return Err(format!(
            "blocks array has {} cells, dimensions require {}",
            level.blocks.len(),
            expected
        ));
    }
    let mut starts = 0;
    for (i, &code) in level.blocks.iter().enumerate() {
        match code {
            AIR_CODE => {}
            PLAYER_START_CODE => starts += 1,
            _ if BlockKind::from_code(code).is_some() => {}
            _ => return Err(format!("unknown cell code {} at index {}", code, i)),
        }
    }
    if starts != 1 {
        return Err(format!("expected exactly one player start, found {}", starts));
    }
    Ok(())
}

/// World position of the top-left corner of cell `index`.
pub fn cell_origin(index: usize, width: usize) -> Vec2 {
    vec2(
        (index % width) as f32 * CELL_SIZE,
        (index / width) as f32 * CELL_SIZE,
    )
}

/// The levels shipped with the game, in descent order. Embedded so web
/// builds need no asset fetch for level data.
pub fn builtin_levels() -> &'static [&'static str] {
    &[
        include_str!("../../assets/levels/level-1.json"),
        include_str!("../../assets/levels/level-2.json"),
        include_str!("../../assets/levels/level-3.json"),
    ]
}
