//! Built-in fallback glyph source.
//!
//! A classic 5×8 column-major bitmap font covering printable ASCII. Used when
//! no font file can be resolved or parsed, so generation never depends on the
//! host having fonts installed. Glyphs are integer-upscaled to approximate the
//! requested pixel size.

use crate::glyph::raster::{compose, CoverageBitmap, PlacedGlyph, Rasterizer};

const GLYPH_COLS: usize = 5;
const GLYPH_ROWS: usize = 8;
const ADVANCE_COLS: usize = GLYPH_COLS + 1;
const LINE_ROWS: usize = GLYPH_ROWS + 1;
/// Upscale cap; 256 × 8 rows matches the largest accepted font size.
const MAX_PIXEL_SCALE: usize = 256;

const FIRST_CHAR: u8 = b' ';
const REPLACEMENT: u8 = b'?';

/// One entry per character from `' '` to `'~'`. Each byte is a column, least
/// significant bit at the top.
#[rustfmt::skip]
const FONT_5X8: [[u8; GLYPH_COLS]; 95] = [
    [0x00, 0x00, 0x00, 0x00, 0x00], // ' '
    [0x00, 0x00, 0x5F, 0x00, 0x00], // !
    [0x00, 0x07, 0x00, 0x07, 0x00], // "
    [0x14, 0x7F, 0x14, 0x7F, 0x14], // #
    [0x24, 0x2A, 0x7F, 0x2A, 0x12], // $
    [0x23, 0x13, 0x08, 0x64, 0x62], // %
    [0x36, 0x49, 0x56, 0x20, 0x50], // &
    [0x00, 0x05, 0x03, 0x00, 0x00], // '
    [0x00, 0x1C, 0x22, 0x41, 0x00], // (
    [0x00, 0x41, 0x22, 0x1C, 0x00], // )
    [0x14, 0x08, 0x3E, 0x08, 0x14], // *
    [0x08, 0x08, 0x3E, 0x08, 0x08], // +
    [0x00, 0x50, 0x30, 0x00, 0x00], // ,
    [0x08, 0x08, 0x08, 0x08, 0x08], // -
    [0x00, 0x60, 0x60, 0x00, 0x00], // .
    [0x20, 0x10, 0x08, 0x04, 0x02], // /
    [0x3E, 0x51, 0x49, 0x45, 0x3E], // 0
    [0x00, 0x42, 0x7F, 0x40, 0x00], // 1
    [0x42, 0x61, 0x51, 0x49, 0x46], // 2
    [0x21, 0x41, 0x45, 0x4B, 0x31], // 3
    [0x18, 0x14, 0x12, 0x7F, 0x10], // 4
    [0x27, 0x45, 0x45, 0x45, 0x39], // 5
    [0x3C, 0x4A, 0x49, 0x49, 0x30], // 6
    [0x01, 0x71, 0x09, 0x05, 0x03], // 7
    [0x36, 0x49, 0x49, 0x49, 0x36], // 8
    [0x06, 0x49, 0x49, 0x29, 0x1E], // 9
    [0x00, 0x36, 0x36, 0x00, 0x00], // :
    [0x00, 0x56, 0x36, 0x00, 0x00], // ;
    [0x08, 0x14, 0x22, 0x41, 0x00], // <
    [0x14, 0x14, 0x14, 0x14, 0x14], // =
    [0x00, 0x41, 0x22, 0x14, 0x08], // >
    [0x02, 0x01, 0x51, 0x09, 0x06], // ?
    [0x32, 0x49, 0x79, 0x41, 0x3E], // @
    [0x7E, 0x11, 0x11, 0x11, 0x7E], // A
    [0x7F, 0x49, 0x49, 0x49, 0x36], // B
    [0x3E, 0x41, 0x41, 0x41, 0x22], // C
    [0x7F, 0x41, 0x41, 0x22, 0x1C], // D
    [0x7F, 0x49, 0x49, 0x49, 0x41], // E
    [0x7F, 0x09, 0x09, 0x09, 0x01], // F
    [0x3E, 0x41, 0x49, 0x49, 0x7A], // G
    [0x7F, 0x08, 0x08, 0x08, 0x7F], // H
    [0x00, 0x41, 0x7F, 0x41, 0x00], // I
    [0x20, 0x40, 0x41, 0x3F, 0x01], // J
    [0x7F, 0x08, 0x14, 0x22, 0x41], // K
    [0x7F, 0x40, 0x40, 0x40, 0x40], // L
    [0x7F, 0x02, 0x0C, 0x02, 0x7F], // M
    [0x7F, 0x04, 0x08, 0x10, 0x7F], // N
    [0x3E, 0x41, 0x41, 0x41, 0x3E], // O
    [0x7F, 0x09, 0x09, 0x09, 0x06], // P
    [0x3E, 0x41, 0x51, 0x21, 0x5E], // Q
    [0x7F, 0x09, 0x19, 0x29, 0x46], // R
    [0x46, 0x49, 0x49, 0x49, 0x31], // S
    [0x01, 0x01, 0x7F, 0x01, 0x01], // T
    [0x3F, 0x40, 0x40, 0x40, 0x3F], // U
    [0x1F, 0x20, 0x40, 0x20, 0x1F], // V
    [0x3F, 0x40, 0x38, 0x40, 0x3F], // W
    [0x63, 0x14, 0x08, 0x14, 0x63], // X
    [0x07, 0x08, 0x70, 0x08, 0x07], // Y
    [0x61, 0x51, 0x49, 0x45, 0x43], // Z
    [0x00, 0x7F, 0x41, 0x41, 0x00], // [
    [0x02, 0x04, 0x08, 0x10, 0x20], // backslash
    [0x00, 0x41, 0x41, 0x7F, 0x00], // ]
    [0x04, 0x02, 0x01, 0x02, 0x04], // ^
    [0x40, 0x40, 0x40, 0x40, 0x40], // _
    [0x00, 0x01, 0x02, 0x04, 0x00], // `
    [0x20, 0x54, 0x54, 0x54, 0x78], // a
    [0x7F, 0x48, 0x44, 0x44, 0x38], // b
    [0x38, 0x44, 0x44, 0x44, 0x20], // c
    [0x38, 0x44, 0x44, 0x48, 0x7F], // d
    [0x38, 0x54, 0x54, 0x54, 0x18], // e
    [0x08, 0x7E, 0x09, 0x01, 0x02], // f
    [0x0C, 0x52, 0x52, 0x52, 0x3E], // g
    [0x7F, 0x08, 0x04, 0x04, 0x78], // h
    [0x00, 0x44, 0x7D, 0x40, 0x00], // i
    [0x20, 0x40, 0x44, 0x3D, 0x00], // j
    [0x7F, 0x10, 0x28, 0x44, 0x00], // k
    [0x00, 0x41, 0x7F, 0x40, 0x00], // l
    [0x7C, 0x04, 0x18, 0x04, 0x78], // m
    [0x7C, 0x08, 0x04, 0x04, 0x78], // n
    [0x38, 0x44, 0x44, 0x44, 0x38], // o
    [0x7C, 0x14, 0x14, 0x14, 0x08], // p
    [0x08, 0x14, 0x14, 0x18, 0x7C], // q
    [0x7C, 0x08, 0x04, 0x04, 0x08], // r
    [0x48, 0x54, 0x54, 0x54, 0x20], // s
    [0x04, 0x3F, 0x44, 0x40, 0x20], // t
    [0x3C, 0x40, 0x40, 0x20, 0x7C], // u
    [0x1C, 0x20, 0x40, 0x20, 0x1C], // v
    [0x3C, 0x40, 0x30, 0x40, 0x3C], // w
    [0x44, 0x28, 0x10, 0x28, 0x44], // x
    [0x0C, 0x50, 0x50, 0x50, 0x3C], // y
    [0x44, 0x64, 0x54, 0x4C, 0x44], // z
    [0x00, 0x08, 0x36, 0x41, 0x00], // {
    [0x00, 0x00, 0x7F, 0x00, 0x00], // |
    [0x00, 0x41, 0x36, 0x08, 0x00], // }
    [0x02, 0x01, 0x02, 0x04, 0x02], // ~
];

/// Column bitmaps for `ch`; characters outside printable ASCII map to `?`.
fn glyph_columns(ch: char) -> &'static [u8; GLYPH_COLS] {
    let code = match u8::try_from(ch) {
        Ok(b) if (FIRST_CHAR..=b'~').contains(&b) => b,
        _ => REPLACEMENT,
    };
    &FONT_5X8[(code - FIRST_CHAR) as usize]
}

/// Bitmap-font rasterizer with no external dependencies.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinRasterizer;

impl BuiltinRasterizer {
    /// Integer upscale factor that brings an 8-row cell close to `size` pixels,
    /// clamped to `1..=256`.
    pub fn pixel_scale(size: f32) -> usize {
        ((size / GLYPH_ROWS as f32).round() as usize).clamp(1, MAX_PIXEL_SCALE)
    }

    fn place(ch: char, x: i32, y: i32, scale: usize) -> PlacedGlyph {
        let columns = glyph_columns(ch);
        let width = GLYPH_COLS * scale;
        let height = GLYPH_ROWS * scale;
        let mut coverage = vec![0u8; width * height];

        for (col, bits) in columns.iter().enumerate() {
            for row in 0..GLYPH_ROWS {
                if bits & (1 << row) == 0 {
                    continue;
                }
                for dy in 0..scale {
                    let start = (row * scale + dy) * width + col * scale;
                    coverage[start..start + scale].fill(255);
                }
            }
        }

        PlacedGlyph {
            x,
            y,
            width,
            height,
            coverage,
        }
    }
}

impl Rasterizer for BuiltinRasterizer {
    fn name(&self) -> &str {
        "builtin-5x8"
    }

    fn rasterize(&self, text: &str, size: f32) -> CoverageBitmap {
        let scale = Self::pixel_scale(size);
        let mut glyphs = Vec::with_capacity(text.len());

        for (line_idx, line) in text.split('\n').enumerate() {
            let y = (line_idx * LINE_ROWS * scale) as i32;
            for (col_idx, ch) in line.chars().enumerate() {
                let x = (col_idx * ADVANCE_COLS * scale) as i32;
                glyphs.push(Self::place(ch, x, y, scale));
            }
        }

        compose(&glyphs, text, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inked(bitmap: &CoverageBitmap) -> usize {
        bitmap.pixels().filter(|p| p.0[0] > 128).count()
    }

    #[test]
    fn test_table_covers_printable_ascii() {
        assert_eq!(FONT_5X8.len(), (b'~' - b' ' + 1) as usize);
        assert_eq!(glyph_columns('A'), &[0x7E, 0x11, 0x11, 0x11, 0x7E]);
        assert_eq!(glyph_columns('é'), glyph_columns('?'));
    }

    #[test]
    fn test_single_letter_at_unit_scale() {
        let bitmap = BuiltinRasterizer.rasterize("I", 8.0);
        // 'I' is a vertical bar with serifs: 3 columns wide, 7 rows tall.
        assert_eq!(bitmap.dimensions(), (3, 7));
        assert_eq!(inked(&bitmap), 7 + 2 + 2);
    }

    #[test]
    fn test_upscaling_multiplies_area() {
        let small = BuiltinRasterizer.rasterize("A", 8.0);
        let large = BuiltinRasterizer.rasterize("A", 24.0);
        assert_eq!(BuiltinRasterizer::pixel_scale(24.0), 3);
        assert_eq!(large.width(), small.width() * 3);
        assert_eq!(large.height(), small.height() * 3);
        assert_eq!(inked(&large), inked(&small) * 9);
    }

    #[test]
    fn test_blank_text_has_no_ink() {
        let bitmap = BuiltinRasterizer.rasterize("   ", 16.0);
        assert_eq!(bitmap.dimensions(), (24, 16));
        assert_eq!(inked(&bitmap), 0);
    }

    #[test]
    fn test_multiline_stacks_vertically() {
        let one = BuiltinRasterizer.rasterize("H", 8.0);
        let two = BuiltinRasterizer.rasterize("H\nH", 8.0);
        assert_eq!(two.width(), one.width());
        assert_eq!(two.height(), one.height() + LINE_ROWS as u32);
    }

    #[test]
    fn test_pixel_scale_is_bounded() {
        assert_eq!(BuiltinRasterizer::pixel_scale(f32::NAN), 1);
        assert_eq!(BuiltinRasterizer::pixel_scale(-40.0), 1);
        assert_eq!(BuiltinRasterizer::pixel_scale(1e9), 256);
        assert_eq!(BuiltinRasterizer::pixel_scale(f32::INFINITY), 256);
    }
}
