//! Rasterizer capability and bitmap composition shared by the backends.

use image::{GrayImage, Luma};
use tracing::debug;

/// Single-channel coverage raster, row-major, 0 = empty, 255 = full ink.
pub type CoverageBitmap = GrayImage;

/// Turns text into a coverage bitmap sized to the text's ink bounding box.
pub trait Rasterizer {
    /// Short human-readable name, used in logs.
    fn name(&self) -> &str;

    fn rasterize(&self, text: &str, size: f32) -> CoverageBitmap;
}

/// A rasterized glyph positioned on an unbounded, y-down text canvas.
#[derive(Clone, Debug)]
pub struct PlacedGlyph {
    /// Left edge in canvas pixels (may be negative)
    pub x: i32,
    /// Top edge in canvas pixels (may be negative)
    pub y: i32,
    pub width: usize,
    pub height: usize,
    /// Row-major coverage, `width * height` bytes
    pub coverage: Vec<u8>,
}

/// Compose placed glyphs into a bitmap cropped to the tight ink box.
///
/// When no glyph has any ink, a blank
/// `max(1, chars * size / 2) × size` bitmap is returned instead.
pub fn compose(glyphs: &[PlacedGlyph], text: &str, size: f32) -> CoverageBitmap {
    let bounds = glyphs.iter().filter_map(ink_extent).reduce(|a, b| {
        (a.0.min(b.0), a.1.min(b.1), a.2.max(b.2), a.3.max(b.3))
    });

    let Some((min_x, min_y, max_x, max_y)) = bounds else {
        let (w, h) = fallback_dimensions(text, size);
        debug!(width = w, height = h, "text has no ink; using blank fallback bitmap");
        return GrayImage::new(w, h);
    };

    let width = (max_x - min_x) as u32;
    let height = (max_y - min_y) as u32;
    let mut bitmap = GrayImage::new(width, height);

    for glyph in glyphs {
        for row in 0..glyph.height {
            for col in 0..glyph.width {
                let value = glyph.coverage[row * glyph.width + col];
                if value == 0 {
                    continue;
                }
                let px = (glyph.x + col as i32 - min_x) as u32;
                let py = (glyph.y + row as i32 - min_y) as u32;
                let Luma([current]) = *bitmap.get_pixel(px, py);
                // Overlapping glyphs keep the stronger coverage.
                bitmap.put_pixel(px, py, Luma([current.max(value)]));
            }
        }
    }

    debug!(width, height, glyphs = glyphs.len(), "composed coverage bitmap");
    bitmap
}

/// Canvas-space `(x0, y0, x1, y1)` of the nonzero pixels of a glyph,
/// exclusive on the right and bottom.
fn ink_extent(glyph: &PlacedGlyph) -> Option<(i32, i32, i32, i32)> {
    let mut extent: Option<(i32, i32, i32, i32)> = None;
    for row in 0..glyph.height {
        for col in 0..glyph.width {
            if glyph.coverage[row * glyph.width + col] == 0 {
                continue;
            }
            let (x, y) = (glyph.x + col as i32, glyph.y + row as i32);
            extent = Some(match extent {
                None => (x, y, x + 1, y + 1),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x + 1), y1.max(y + 1)),
            });
        }
    }
    extent
}

/// Dimensions used when the text's ink box degenerates to zero area.
///
/// Non-finite or sub-pixel sizes count as 1; the width saturates at `u32::MAX`.
pub fn fallback_dimensions(text: &str, size: f32) -> (u32, u32) {
    let size = if size.is_finite() { size.max(1.0) as u32 } else { 1 };
    let chars = text.chars().count() as u64;
    let width = (chars * size as u64 / 2).clamp(1, u32::MAX as u64) as u32;
    (width, size)
}
