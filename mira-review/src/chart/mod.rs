//! North-Indian kundli chart rendering
//!
//! Outer square, inner diamond joining the side midpoints, and both
//! diagonals. Each house draws its number, sign and planets inside a fixed
//! label rectangle, clipped to it, so one house's content never touches
//! pixels outside its own rectangle.

pub mod canvas;
pub mod font;

pub use canvas::Rect;

use crate::astro::{planet_abbreviation, sign_abbreviation, HouseChart, HOUSE_COUNT};
use canvas::{text_width, Canvas};
use image::{ImageFormat, Rgb};
use mira_common::{Error, Result};
use std::io::Cursor;

const BACKGROUND: Rgb<u8> = Rgb([0xff, 0xfe, 0xf7]);
const BORDER: Rgb<u8> = Rgb([0x00, 0x00, 0x00]);
const NUMBER: Rgb<u8> = Rgb([0x61, 0x61, 0x61]);
const SIGN: Rgb<u8> = Rgb([0x19, 0x76, 0xd2]);
const PLANET: Rgb<u8> = Rgb([0xd3, 0x2f, 0x2f]);

/// Label boxes on an 800-unit chart square: (centre x, centre y, width, height)
const LABEL_GRID: [(i64, i64, i64, i64); HOUSE_COUNT] = [
    (400, 200, 180, 180), // 1
    (200, 67, 140, 107),  // 2
    (67, 200, 107, 140),  // 3
    (200, 400, 180, 180), // 4
    (67, 600, 107, 140),  // 5
    (200, 733, 140, 107), // 6
    (400, 600, 180, 180), // 7
    (600, 733, 140, 107), // 8
    (733, 600, 107, 140), // 9
    (600, 400, 180, 180), // 10
    (733, 200, 107, 140), // 11
    (600, 67, 140, 107),  // 12
];
const GRID: i64 = 800;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartConfig {
    /// Width and height of the PNG in pixels
    pub size: u32,
    /// Pixel multiplier for sign and planet text
    pub text_scale: i64,
    pub line_thickness: i64,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            size: 600,
            text_scale: 2,
            line_thickness: 3,
        }
    }
}

pub struct ChartRenderer {
    config: ChartConfig,
}

impl ChartRenderer {
    pub fn new(config: ChartConfig) -> Result<Self> {
        if config.size < 200 {
            return Err(Error::InvalidInput(format!("Chart size {} is below 200px", config.size)));
        }
        if config.text_scale < 1 || config.line_thickness < 1 {
            return Err(Error::InvalidInput("Chart scale and line thickness must be positive".to_string()));
        }
        Ok(Self { config })
    }

    fn margin(&self) -> i64 {
        self.config.size as i64 / 10
    }

    fn span(&self) -> i64 {
        self.config.size as i64 - 2 * self.margin()
    }

    /// Label rectangle of a house (1-based), in image pixels
    pub fn label_rect(&self, house: usize) -> Option<Rect> {
        let (cx, cy, w, h) = *LABEL_GRID.get(house.checked_sub(1)?)?;
        let (m, span) = (self.margin(), self.span());
        Some(Rect::centered(
            m + cx * span / GRID,
            m + cy * span / GRID,
            w * span / GRID,
            h * span / GRID,
        ))
    }

    /// Render the chart to PNG bytes
    pub fn render_png(&self, chart: &HouseChart) -> Result<Vec<u8>> {
        let image = self.render(chart);
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| Error::Encode {
                format: "PNG",
                message: e.to_string(),
            })?;
        Ok(bytes)
    }

    /// Render the chart to an RGB image
    pub fn render(&self, chart: &HouseChart) -> image::RgbImage {
        let mut canvas = Canvas::new(self.config.size, self.config.size, BACKGROUND);
        self.draw_frame(&mut canvas);

        for (index, house) in chart.houses.iter().enumerate() {
            let number = index + 1;
            let Some(rect) = self.label_rect(number) else { continue };
            canvas.text(rect.x + 1, rect.y + 1, &number.to_string(), 1, NUMBER, Some(rect));

            let mut lines: Vec<(String, Rgb<u8>)> = Vec::new();
            if let Some(sign) = &house.sign {
                lines.push((sign_abbreviation(sign), SIGN));
            }
            let planets: Vec<String> = house.planets.iter().map(|p| planet_abbreviation(p)).collect();
            for pair in planets.chunks(2) {
                lines.push((pair.join(" "), PLANET));
            }

            let scale = self.config.text_scale;
            let line_height = (font::GLYPH_HEIGHT as i64 + 2) * scale;
            let mut y = rect.y + font::GLYPH_HEIGHT as i64 + 3;
            for (text, color) in lines {
                let x = rect.x + (rect.width - text_width(&text, scale)) / 2;
                canvas.text(x.max(rect.x), y, &text, scale, color, Some(rect));
                y += line_height;
            }
        }

        canvas.into_image()
    }

    fn draw_frame(&self, canvas: &mut Canvas) {
        let (m, span, t) = (self.margin(), self.span(), self.config.line_thickness);
        let (left, top, right, bottom) = (m, m, m + span, m + span);
        let (mid_x, mid_y) = (m + span / 2, m + span / 2);

        canvas.rect_outline(
            Rect {
                x: left,
                y: top,
                width: span + 1,
                height: span + 1,
            },
            t,
            BORDER,
        );

        // Diagonals
        canvas.line((left, top), (right, bottom), t, BORDER);
        canvas.line((right, top), (left, bottom), t, BORDER);

        // Inner diamond
        canvas.line((mid_x, top), (right, mid_y), t, BORDER);
        canvas.line((right, mid_y), (mid_x, bottom), t, BORDER);
        canvas.line((mid_x, bottom), (left, mid_y), t, BORDER);
        canvas.line((left, mid_y), (mid_x, top), t, BORDER);
    }
}

impl Default for ChartRenderer {
    fn default() -> Self {
        Self {
            config: ChartConfig::default(),
        }
    }
}
