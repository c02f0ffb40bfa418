//! Sprite atlases and animation playback
//!
//! Atlases use the Aseprite JSON export: a frame map keyed by frame index,
//! and tagged frame ranges for animations. Frame durations are milliseconds
//! in the file, converted to seconds on use.
//!
//! A missing frame or tag logs a warning and draws nothing; art problems
//! must never take the game down.

use std::collections::HashMap;
use std::fmt;

use macroquad::color::WHITE;
use macroquad::file::load_string;
use macroquad::logging::warn;
use macroquad::math::{vec2, Rect, Vec2};
use macroquad::texture::{
    draw_texture_ex, load_texture, DrawTextureParams, FilterMode, Texture2D,
};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct FrameRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FrameData {
    pub frame: FrameRect,
    /// Milliseconds, per the Aseprite export.
    #[serde(default)]
    pub duration: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FrameTag {
    pub name: String,
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AtlasMeta {
    #[serde(rename = "frameTags", default)]
    pub frame_tags: Vec<FrameTag>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AtlasData {
    pub frames: HashMap<String, FrameData>,
    #[serde(default)]
    pub meta: AtlasMeta,
}

#[derive(Debug)]
pub enum SpriteError {
    Load(macroquad::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for SpriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpriteError::Load(e) => write!(f, "could not load sprite asset: {}", e),
            SpriteError::Parse(e) => write!(f, "sprite data is not valid JSON: {}", e),
        }
    }
}

impl From<macroquad::Error> for SpriteError {
    fn from(e: macroquad::Error) -> Self {
        SpriteError::Load(e)
    }
}

impl From<serde_json::Error> for SpriteError {
    fn from(e: serde_json::Error) -> Self {
        SpriteError::Parse(e)
    }
}

/// Parse an atlas JSON blob. Split out from `Sprite::load` so data handling
/// is testable without a texture.
pub fn parse_atlas(json: &str) -> Result<AtlasData, serde_json::Error> {
    serde_json::from_str(json)
}

pub struct Sprite {
    pub texture: Texture2D,
    pub data: AtlasData,
}

impl Sprite {
    pub async fn load(image_path: &str, data_path: &str) -> Result<Sprite, SpriteError> {
        let texture = load_texture(image_path).await?;
        texture.set_filter(FilterMode::Nearest);
        let json = load_string(data_path).await?;
        let data = parse_atlas(&json)?;
        Ok(Sprite { texture, data })
    }

    pub fn frame(&self, name: &str) -> Option<&FrameData> {
        self.data.frames.get(name)
    }

    pub fn frame_size(&self, name: &str) -> Option<Vec2> {
        self.frame(name).map(|f| vec2(f.frame.w, f.frame.h))
    }

    pub fn tag(&self, name: &str) -> Option<&FrameTag> {
        self.data.meta.frame_tags.iter().find(|t| t.name == name)
    }

    /// Draw one frame at canvas coordinates, snapped to whole pixels.
    pub fn draw_frame(&self, name: &str, x: f32, y: f32) {
        let Some(frame) = self.frame(name) else {
            warn!("sprite frame '{}' not in atlas", name);
            return;
        };
        draw_texture_ex(
            &self.texture,
            x.round(),
            y.round(),
            WHITE,
            DrawTextureParams {
                source: Some(Rect::new(
                    frame.frame.x,
                    frame.frame.y,
                    frame.frame.w,
                    frame.frame.h,
                )),
                ..Default::default()
            },
        );
    }
}

/// Playback cursor over a sprite's tagged animations. Switching tags
/// restarts from the tag's first frame.
pub struct AnimationPlayer {
    tag: Option<String>,
    frame_index: usize,
    elapsed: f32,
}

impl AnimationPlayer {
    pub fn new() -> Self {
        Self { tag: None, frame_index: 0, elapsed: 0.0 }
    }

    /// Advance the animation by `dt` and draw the current frame.
    pub fn draw(&mut self, sprite: &Sprite, tag_name: &str, x: f32, y: f32, dt: f32, repeat: bool) {
        let Some(tag) = sprite.tag(tag_name) else {
            warn!("animation tag '{}' not in atlas", tag_name);
            return;
        };
        let (from, to) = (tag.from, tag.to);

        if self.tag.as_deref() != Some(tag_name) {
            self.tag = Some(tag_name.to_string());
            self.frame_index = from;
            self.elapsed = 0.0;
        }

        let frame_name = self.frame_index.to_string();
        let duration = sprite
            .frame(&frame_name)
            .map(|f| f.duration / 1000.0)
            .unwrap_or(0.1);

        self.elapsed += dt;
        if self.elapsed >= duration {
            self.elapsed = 0.0;
            self.frame_index += 1;
            if self.frame_index > to {
                self.frame_index = if repeat { from } else { to };
            }
        }

        sprite.draw_frame(&self.frame_index.to_string(), x, y);
    }
}

impl Default for AnimationPlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "frames": {
            "0": { "frame": { "x": 0, "y": 0, "w": 16, "h": 16 }, "duration": 100 },
            "1": { "frame": { "x": 16, "y": 0, "w": 16, "h": 16 }, "duration": 100 },
            "dirt": { "frame": { "x": 0, "y": 16, "w": 32, "h": 32 }, "duration": 0 }
        },
        "meta": {
            "frameTags": [
                { "name": "idle", "from": 0, "to": 1 }
            ]
        }
    }"#;

    #[test]
    fn parses_aseprite_style_atlas() {
        let atlas = parse_atlas(SAMPLE).unwrap();
        assert_eq!(atlas.frames.len(), 3);
        let dirt = &atlas.frames["dirt"];
        assert_eq!(dirt.frame.y, 16.0);
        assert_eq!(dirt.frame.w, 32.0);
        assert_eq!(atlas.meta.frame_tags.len(), 1);
        assert_eq!(atlas.meta.frame_tags[0].name, "idle");
        assert_eq!(atlas.meta.frame_tags[0].to, 1);
    }

    #[test]
    fn atlas_without_meta_parses() {
        let atlas = parse_atlas(r#"{"frames":{}}"#).unwrap();
        assert!(atlas.meta.frame_tags.is_empty());
    }

    #[test]
    fn rejects_malformed_atlas() {
        assert!(parse_atlas(r#"{"frames": 12}"#).is_err());
    }

    #[test]
    fn builtin_atlases_all_parse() {
        for source in [
            include_str!("../../assets/sprites/player-sprite.json"),
            include_str!("../../assets/sprites/blocks-sprite.json"),
            include_str!("../../assets/sprites/lantern-sprite.json"),
            include_str!("../../assets/sprites/font-sprite.json"),
        ] {
            parse_atlas(source).unwrap();
        }
    }
}
