//! Seed point extraction from a coverage bitmap.
//!
//! Steps, in order:
//! 1. Row-major scan, keeping pixels with coverage above [`COVERAGE_THRESHOLD`]
//! 2. Decimation: keep every `step`-th kept pixel (deterministic)
//! 3. Recenter on the mean and divide by [`PIXELS_PER_UNIT`]
//! 4. Jitter x/y, and draw z from a small uniform band
//!
//! Image y points down and is kept that way, so text reads upright in viewers
//! that look down -z with y down.

use crate::error::SplatError;
use crate::glyph::raster::CoverageBitmap;
use nalgebra::Vector3;
use rand::Rng;
use tracing::debug;

/// Pixels with coverage strictly greater than this are inked.
pub const COVERAGE_THRESHOLD: u8 = 128;

/// Pixel units per world unit.
pub const PIXELS_PER_UNIT: f32 = 100.0;

/// Half-width of the uniform x/y position jitter, world units.
pub const XY_JITTER: f32 = 0.006;

/// Half-width of the uniform z band, world units.
pub const Z_JITTER: f32 = 0.004;

/// Pixel coordinates `(x, y)` of inked pixels, in row-major scan order.
pub fn inked_pixels(bitmap: &CoverageBitmap) -> Vec<(u32, u32)> {
    bitmap
        .enumerate_pixels()
        .filter(|(_, _, p)| p.0[0] > COVERAGE_THRESHOLD)
        .map(|(x, y, _)| (x, y))
        .collect()
}

/// Keep every `step`-th entry starting with the first. `step` of 0 or 1
/// keeps everything.
pub fn decimate<T: Copy>(items: &[T], step: usize) -> Vec<T> {
    items.iter().copied().step_by(step.max(1)).collect()
}

/// Extract centered, scaled, jittered seed points from a coverage bitmap.
///
/// Fails with [`SplatError::EmptyGeometry`] when no pixel passes the
/// coverage threshold.
pub fn extract_points<R: Rng + ?Sized>(
    bitmap: &CoverageBitmap,
    step: usize,
    rng: &mut R,
) -> Result<Vec<Vector3<f32>>, SplatError> {
    let raw = inked_pixels(bitmap);
    let kept = decimate(&raw, step);
    debug!(
        width = bitmap.width(),
        height = bitmap.height(),
        inked = raw.len(),
        kept = kept.len(),
        step,
        "extracted glyph pixels"
    );

    if kept.is_empty() {
        return Err(SplatError::EmptyGeometry);
    }

    let n = kept.len() as f64;
    let mean_x = kept.iter().map(|&(x, _)| x as f64).sum::<f64>() / n;
    let mean_y = kept.iter().map(|&(_, y)| y as f64).sum::<f64>() / n;

    let points = kept
        .iter()
        .map(|&(px, py)| {
            let x = ((px as f64 - mean_x) as f32) / PIXELS_PER_UNIT;
            let y = ((py as f64 - mean_y) as f32) / PIXELS_PER_UNIT;
            Vector3::new(
                x + rng.gen_range(-XY_JITTER..=XY_JITTER),
                y + rng.gen_range(-XY_JITTER..=XY_JITTER),
                rng.gen_range(-Z_JITTER..=Z_JITTER),
            )
        })
        .collect();

    Ok(points)
}
