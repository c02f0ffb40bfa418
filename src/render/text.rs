//! Bitmap font text
//!
//! Glyphs live in the font sprite atlas, keyed by index into `CHARSET`.
//! Widths are per-glyph so narrow characters pack tighter. If the font
//! sprite failed to load, text falls back to macroquad's built-in font so
//! menus stay readable.

use macroquad::color::WHITE;
use macroquad::text::{draw_text, measure_text};

use super::sprite::Sprite;

/// Glyph order in the font atlas. Frame name is the index as a string.
const CHARSET: &str = "abcdefghijklmnopqrstuvwxyz0123456789.,!?+-:>< ";

pub const GLYPH_HEIGHT: f32 = 8.0;
pub const LINE_HEIGHT: f32 = 10.0;

const FALLBACK_FONT_SIZE: u16 = 16;

fn glyph_index(c: char) -> Option<usize> {
    CHARSET.find(c)
}

fn glyph_width(c: char) -> f32 {
    match c {
        'i' | 'l' | '.' | ',' | '!' | ':' | ' ' => 4.0,
        _ => 6.0,
    }
}

/// Width in canvas pixels of one line of bitmap text.
pub fn measure_line(text: &str) -> f32 {
    text.chars()
        .map(|c| glyph_width(c.to_ascii_lowercase()))
        .sum()
}

/// Draw text at canvas coordinates. Newlines start a new line below.
/// Characters outside the charset render as blanks.
pub fn draw_bitmap_text(font: Option<&Sprite>, text: &str, x: f32, y: f32, centered: bool) {
    let Some(font) = font else {
        draw_fallback_text(text, x, y, centered);
        return;
    };

    let mut line_y = y;
    for line in text.split('\n') {
        let mut cursor = if centered {
            x - (measure_line(line) / 2.0).floor()
        } else {
            x
        };
        for c in line.chars() {
            let c = c.to_ascii_lowercase();
            if c != ' ' {
                if let Some(index) = glyph_index(c) {
                    font.draw_frame(&index.to_string(), cursor, line_y);
                }
            }
            cursor += glyph_width(c);
        }
        line_y += LINE_HEIGHT;
    }
}

fn draw_fallback_text(text: &str, x: f32, y: f32, centered: bool) {
    let mut line_y = y;
    for line in text.split('\n') {
        let draw_x = if centered {
            let size = measure_text(line, None, FALLBACK_FONT_SIZE, 1.0);
            x - (size.width / 2.0).floor()
        } else {
            x
        };
        draw_text(line, draw_x, line_y + GLYPH_HEIGHT, FALLBACK_FONT_SIZE as f32, WHITE);
        line_y += LINE_HEIGHT;
    }
}
