//! Rendering support
//!
//! The game draws into a fixed 320x240 canvas which is then scaled to the
//! window by an integer factor. Sprites come from Aseprite-style atlases;
//! text from a bitmap font sprite; debug shapes go through a deferred queue
//! so they always land on top of the frame.

pub mod canvas;
pub mod debug;
pub mod queue;
pub mod sprite;
pub mod text;
