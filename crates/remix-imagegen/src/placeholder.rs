//! Locally drawn substitute images
//!
//! Used whenever an upstream generation fails and by the test endpoint.

use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use font8x8::{BASIC_FONTS, LATIN_FONTS, UnicodeFonts};
use image::{Rgb, RgbImage};
use imageproc::{
    drawing::{draw_hollow_rect_mut, draw_text_mut, text_size},
    rect::Rect,
};
use remix_config::PlaceholderConfig;
use sha2::{Digest, Sha256};

/// Side length of every placeholder
pub const PLACEHOLDER_SIZE: u32 = 512;

const PALETTE: [Rgb<u8>; 4] = [
    Rgb([100, 150, 200]),
    Rgb([150, 100, 200]),
    Rgb([200, 150, 100]),
    Rgb([100, 200, 150]),
];

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

const TITLE_SIZE: u32 = 32;
const TITLE_Y: i32 = 200;
const BODY_SIZE: u32 = 16;
const BODY_Y: i32 = 280;
const BODY_LINE_HEIGHT: usize = 20;
const BODY_MAX_LINES: usize = 3;
const BODY_MAX_WIDTH: u32 = 400;
const BORDER_INSET: u32 = 50;
const BORDER_WIDTH: u32 = 3;

/// Glyph source for placeholder text
enum Typeface {
    /// Scalable font loaded from disk
    TrueType(FontVec),
    /// Built-in 8x8 bitmap glyphs, scaled by whole pixels
    Bitmap,
}

impl Typeface {
    fn load(path: &Path) -> Self {
        let font = std::fs::read(path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| FontVec::try_from_vec(bytes).map_err(|e| e.to_string()));

        match font {
            Ok(font) => Self::TrueType(font),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "placeholder font unavailable, using built-in bitmap font");
                Self::Bitmap
            }
        }
    }

    fn is_bitmap(&self) -> bool {
        matches!(self, Self::Bitmap)
    }

    fn text_width(&self, size: u32, text: &str) -> u32 {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::TrueType(font) => text_size(PxScale::from(size as f32), font, text).0,
            Self::Bitmap => {
                let glyphs = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
                glyphs.saturating_mul(8 * bitmap_scale(size))
            }
        }
    }

    fn draw(&self, canvas: &mut RgbImage, x: i32, y: i32, size: u32, text: &str) {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::TrueType(font) => draw_text_mut(canvas, WHITE, x, y, PxScale::from(size as f32), font, text),
            Self::Bitmap => draw_bitmap_text(canvas, x, y, bitmap_scale(size), text),
        }
    }
}

/// Bitmap glyphs are 8px; 16px text draws them at 1x
fn bitmap_scale(size: u32) -> u32 {
    (size / 16).max(1)
}

fn draw_bitmap_text(canvas: &mut RgbImage, x: i32, y: i32, scale: u32, text: &str) {
    let step = i64::from(8 * scale);

    for (index, ch) in text.chars().enumerate() {
        let glyph = BASIC_FONTS
            .get(ch)
            .or_else(|| LATIN_FONTS.get(ch))
            .or_else(|| BASIC_FONTS.get('?'))
            .unwrap_or([0; 8]);

        let origin_x = i64::from(x) + i64::try_from(index).unwrap_or(i64::MAX / 2) * step;

        for (row, bits) in glyph.iter().enumerate() {
            for column in 0..8u32 {
                if bits & (1 << column) == 0 {
                    continue;
                }

                for dy in 0..scale {
                    for dx in 0..scale {
                        let px = origin_x + i64::from(column * scale + dx);
                        let py = i64::from(y) + i64::from(u32::try_from(row).unwrap_or(0) * scale + dy);
                        put_pixel_checked(canvas, px, py);
                    }
                }
            }
        }
    }
}

fn put_pixel_checked(canvas: &mut RgbImage, x: i64, y: i64) {
    if let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y))
        && x < canvas.width()
        && y < canvas.height()
    {
        canvas.put_pixel(x, y, WHITE);
    }
}

/// Renders placeholder images with fonts resolved once at startup
pub struct PlaceholderRenderer {
    title_font: Typeface,
    body_font: Typeface,
}

impl PlaceholderRenderer {
    /// Load the configured fonts, falling back to the bitmap font per face
    pub fn new(config: &PlaceholderConfig) -> Self {
        Self {
            title_font: Typeface::load(&config.bold_font),
            body_font: Typeface::load(&config.regular_font),
        }
    }

    /// Renderer that never touches the filesystem
    pub fn bitmap() -> Self {
        Self {
            title_font: Typeface::Bitmap,
            body_font: Typeface::Bitmap,
        }
    }

    /// Whether both faces fell back to the built-in font
    pub fn uses_bitmap_fonts(&self) -> bool {
        self.title_font.is_bitmap() && self.body_font.is_bitmap()
    }

    /// Draw a 512x512 placeholder titled `label` with `prompt` wrapped below
    pub fn render(&self, label: &str, prompt: &str) -> RgbImage {
        let mut canvas = RgbImage::from_pixel(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, background_for(label));

        let title_width = self.title_font.text_width(TITLE_SIZE, label);
        self.title_font
            .draw(&mut canvas, centered_x(title_width), TITLE_Y, TITLE_SIZE, label);

        let lines = wrap_words(prompt, BODY_MAX_WIDTH, |line| self.body_font.text_width(BODY_SIZE, line));

        for (y, line) in (BODY_Y..).step_by(BODY_LINE_HEIGHT).zip(lines.iter().take(BODY_MAX_LINES)) {
            let width = self.body_font.text_width(BODY_SIZE, line);
            self.body_font.draw(&mut canvas, centered_x(width), y, BODY_SIZE, line);
        }

        draw_border(&mut canvas);

        canvas
    }
}

/// Background colour, stable for a given label across processes
pub fn background_for(label: &str) -> Rgb<u8> {
    let digest = Sha256::digest(label.as_bytes());
    PALETTE[usize::from(digest[0]) % PALETTE.len()]
}

fn centered_x(width: u32) -> i32 {
    let offset = (i64::from(PLACEHOLDER_SIZE) - i64::from(width)) / 2;
    i32::try_from(offset).unwrap_or(i32::MIN)
}

/// Greedy word wrap keeping each line strictly narrower than `max_width`
///
/// A single word wider than the limit still gets a line of its own.
fn wrap_words(text: &str, max_width: u32, measure: impl Fn(&str) -> u32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };

        if measure(&candidate) < max_width {
            current = candidate;
        } else {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            current = word.to_string();
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

fn draw_border(canvas: &mut RgbImage) {
    let side = PLACEHOLDER_SIZE - 2 * BORDER_INSET + 1;

    for inset in 0..BORDER_WIDTH {
        let origin = i32::try_from(BORDER_INSET + inset).unwrap_or_default();
        let rect = Rect::at(origin, origin).of_size(side - 2 * inset, side - 2 * inset);
        draw_hollow_rect_mut(canvas, rect, WHITE);
    }
}
