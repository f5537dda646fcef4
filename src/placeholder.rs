//! Synthetic placeholder bitmaps for rows whose image cannot be shown.
//!
//! Labels are drawn with a small built-in 5x7 font so that placeholders are
//! deterministic and need no font files at runtime.

use image::{Rgba, RgbaImage};
use once_cell::sync::Lazy;
use std::fmt;
use std::sync::Arc;

use crate::config::{PLACEHOLDER_BACKGROUND, PLACEHOLDER_FOREGROUND, PLACEHOLDER_SIZE};

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
const GLYPH_SCALE: u32 = 3;

/// Why a row is shown as a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    FileMissing,
    DataError,
}

impl Placeholder {
    pub fn label(&self) -> &'static str {
        match self {
            Placeholder::FileMissing => "File missing",
            Placeholder::DataError => "Data error",
        }
    }

    /// Shared pre-rendered pixels for this placeholder.
    pub fn pixels(&self) -> Arc<RgbaImage> {
        match self {
            Placeholder::FileMissing => FILE_MISSING.clone(),
            Placeholder::DataError => DATA_ERROR.clone(),
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

static FILE_MISSING: Lazy<Arc<RgbaImage>> =
    Lazy::new(|| Arc::new(render_label(Placeholder::FileMissing.label())));
static DATA_ERROR: Lazy<Arc<RgbaImage>> =
    Lazy::new(|| Arc::new(render_label(Placeholder::DataError.label())));

/// Renders a square placeholder with the label centred.
pub fn render_label(label: &str) -> RgbaImage {
    let [r, g, b] = PLACEHOLDER_BACKGROUND;
    let mut image = RgbaImage::from_pixel(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, Rgba([r, g, b, 255]));
    let [r, g, b] = PLACEHOLDER_FOREGROUND;
    let ink = Rgba([r, g, b, 255]);

    let chars: Vec<char> = label.chars().map(|c| c.to_ascii_uppercase()).collect();
    let advance = (GLYPH_WIDTH + 1) * GLYPH_SCALE;
    let text_width = (chars.len() as u32 * advance).saturating_sub(GLYPH_SCALE);
    let text_height = GLYPH_HEIGHT * GLYPH_SCALE;
    let origin_x = PLACEHOLDER_SIZE.saturating_sub(text_width) / 2;
    let origin_y = PLACEHOLDER_SIZE.saturating_sub(text_height) / 2;

    for (i, c) in chars.iter().enumerate() {
        let Some(rows) = glyph(*c) else { continue };
        let glyph_x = origin_x + i as u32 * advance;
        for (gy, bits) in rows.iter().enumerate() {
            for gx in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - gx)) == 0 {
                    continue;
                }
                for dy in 0..GLYPH_SCALE {
                    for dx in 0..GLYPH_SCALE {
                        let x = glyph_x + gx * GLYPH_SCALE + dx;
                        let y = origin_y + gy as u32 * GLYPH_SCALE + dy;
                        if x < PLACEHOLDER_SIZE && y < PLACEHOLDER_SIZE {
                            image.put_pixel(x, y, ink);
                        }
                    }
                }
            }
        }
    }

    image
}

/// Row bitmaps for an uppercase letter; anything else renders as a gap.
fn glyph(c: char) -> Option<&'static [u8; 7]> {
    if c.is_ascii_uppercase() {
        Some(&FONT[(c as u8 - b'A') as usize])
    } else {
        None
    }
}

const FONT: [[u8; 7]; 26] = [
    [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11], // A
    [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E], // B
    [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E], // C
    [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E], // D
    [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F], // E
    [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10], // F
    [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F], // G
    [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11], // H
    [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E], // I
    [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C], // J
    [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11], // K
    [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F], // L
    [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11], // M
    [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11], // N
    [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E], // O
    [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10], // P
    [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D], // Q
    [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11], // R
    [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E], // S
    [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04], // T
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E], // U
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04], // V
    [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A], // W
    [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11], // X
    [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04], // Y
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F], // Z
];
