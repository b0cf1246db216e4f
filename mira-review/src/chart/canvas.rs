//! Minimal raster drawing on an RGB buffer

use super::font::{glyph, pixel_set, GLYPH_HEIGHT, GLYPH_WIDTH};
use image::{Rgb, RgbImage};

/// Axis-aligned pixel rectangle, `[x, x + width) × [y, y + height)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl Rect {
    pub fn centered(cx: i64, cy: i64, width: i64, height: i64) -> Self {
        Self {
            x: cx - width / 2,
            y: cy - height / 2,
            width,
            height,
        }
    }

    pub fn contains(&self, px: i64, py: i64) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

pub struct Canvas {
    image: RgbImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Rgb<u8>) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, background),
        }
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    fn put(&mut self, x: i64, y: i64, color: Rgb<u8>) {
        if x >= 0 && y >= 0 && (x as u32) < self.image.width() && (y as u32) < self.image.height() {
            self.image.put_pixel(x as u32, y as u32, color);
        }
    }

    /// Straight line with a square pen of the given thickness (Bresenham)
    pub fn line(&mut self, from: (i64, i64), to: (i64, i64), thickness: i64, color: Rgb<u8>) {
        let (mut x, mut y) = from;
        let dx = (to.0 - x).abs();
        let dy = -(to.1 - y).abs();
        let sx = if x < to.0 { 1 } else { -1 };
        let sy = if y < to.1 { 1 } else { -1 };
        let mut err = dx + dy;
        let half = thickness / 2;

        loop {
            for oy in -half..thickness - half {
                for ox in -half..thickness - half {
                    self.put(x + ox, y + oy, color);
                }
            }
            if x == to.0 && y == to.1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Outline of a rectangle
    pub fn rect_outline(&mut self, rect: Rect, thickness: i64, color: Rgb<u8>) {
        let (x0, y0) = (rect.x, rect.y);
        let (x1, y1) = (rect.x + rect.width - 1, rect.y + rect.height - 1);
        self.line((x0, y0), (x1, y0), thickness, color);
        self.line((x1, y0), (x1, y1), thickness, color);
        self.line((x1, y1), (x0, y1), thickness, color);
        self.line((x0, y1), (x0, y0), thickness, color);
    }

    /// Text with its top-left corner at (`x`, `y`); pixels outside `clip` are dropped
    pub fn text(&mut self, x: i64, y: i64, text: &str, scale: i64, color: Rgb<u8>, clip: Option<Rect>) {
        let advance = text_advance(scale);
        for (i, ch) in text.chars().enumerate() {
            let bits = glyph(ch);
            let gx = x + i as i64 * advance;
            for row in 0..GLYPH_HEIGHT {
                for col in 0..GLYPH_WIDTH {
                    if !pixel_set(&bits, col, row) {
                        continue;
                    }
                    for sy in 0..scale {
                        for sx in 0..scale {
                            let px = gx + col as i64 * scale + sx;
                            let py = y + row as i64 * scale + sy;
                            if clip.map(|r| r.contains(px, py)).unwrap_or(true) {
                                self.put(px, py, color);
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Horizontal distance between glyph origins
pub fn text_advance(scale: i64) -> i64 {
    (GLYPH_WIDTH as i64 + 1) * scale
}

/// Rendered width of a string
pub fn text_width(text: &str, scale: i64) -> i64 {
    let n = text.chars().count() as i64;
    if n == 0 {
        0
    } else {
        n * text_advance(scale) - scale
    }
}
