//! Geometry synthesis: seed points → full per-point linear attributes.
//!
//! Three independent passes build a [`SplatCloud`]:
//! - layering: optional duplicates stacked behind each seed (-z)
//! - color: flat, or a top→bottom gradient over y with bounded noise
//! - scale: per-point random multipliers around base xy / z magnitudes

use crate::core::color::Rgb;
use crate::core::SplatCloud;
use crate::error::SplatError;
use nalgebra::Vector3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Half-width of the per-channel noise added to gradient colors.
pub const COLOR_NOISE: f32 = 0.06;

/// Range of the per-point xy scale multiplier.
pub const XY_SCALE_RANGE: (f32, f32) = (0.72, 1.28);

/// Range of the per-point z scale multiplier.
pub const Z_SCALE_RANGE: (f32, f32) = (0.65, 1.35);

/// Keeps the gradient parameter finite when every point shares one y.
const Y_RANGE_EPS: f32 = 1e-8;

/// Duplicate layers stacked behind each seed point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerParams {
    /// Number of extra layers `L`; 0 keeps only the seeds
    pub count: usize,
    /// Distance between consecutive layers along -z
    pub spacing: f32,
    /// Half-width of the x/y jitter applied to duplicates
    pub jitter_xy: f32,
    /// Half-width of the z jitter applied to duplicates
    pub jitter_z: f32,
}

impl Default for LayerParams {
    fn default() -> Self {
        Self {
            count: 0,
            spacing: 0.1,
            jitter_xy: 0.004,
            jitter_z: 0.004,
        }
    }
}

/// How points are colored.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    /// Interpolate from `top` (minimum y) to `bottom` (maximum y).
    Gradient { top: Rgb, bottom: Rgb },
    /// Same color for every point.
    Flat(Rgb),
}

impl Default for ColorMode {
    fn default() -> Self {
        ColorMode::Gradient {
            top: Rgb::new(135.0 / 255.0, 206.0 / 255.0, 235.0 / 255.0),
            bottom: Rgb::new(1.0, 215.0 / 255.0, 0.0),
        }
    }
}

/// Base linear scale magnitudes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleParams {
    pub base_xy: f32,
    pub base_z: f32,
}

impl Default for ScaleParams {
    fn default() -> Self {
        Self {
            base_xy: 0.016,
            base_z: 0.04,
        }
    }
}

/// Everything the synthesizer needs besides the seed points.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthParams {
    pub layers: LayerParams,
    pub color: ColorMode,
    pub opacity: f32,
    pub scale: ScaleParams,
}

impl Default for SynthParams {
    fn default() -> Self {
        Self {
            layers: LayerParams::default(),
            color: ColorMode::default(),
            opacity: 0.95,
            scale: ScaleParams::default(),
        }
    }
}

impl SynthParams {
    pub fn new(color: ColorMode, opacity: f32) -> Self {
        Self {
            color,
            opacity,
            ..Default::default()
        }
    }

    /// Reject non-finite or out-of-range tunables before any sampling.
    ///
    /// Sampling ranges must be finite, layer spacing and jitters non-negative,
    /// base scales positive, and opacity strictly inside (0, 1).
    pub fn validate(&self) -> Result<(), SplatError> {
        non_negative("layers.spacing", self.layers.spacing)?;
        non_negative("layers.jitter_xy", self.layers.jitter_xy)?;
        non_negative("layers.jitter_z", self.layers.jitter_z)?;
        positive("scale.base_xy", self.scale.base_xy)?;
        positive("scale.base_z", self.scale.base_z)?;
        if !(self.opacity > 0.0 && self.opacity < 1.0) {
            return Err(SplatError::parameter(
                "opacity",
                format!("{} is not inside (0, 1)", self.opacity),
            ));
        }
        Ok(())
    }
}

fn non_negative(name: &'static str, value: f32) -> Result<(), SplatError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SplatError::parameter(name, format!("{value} must be finite and >= 0")))
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), SplatError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SplatError::parameter(name, format!("{value} must be finite and > 0")))
    }
}

/// Expand `seeds` into `seeds.len() * (L + 1)` points: each seed followed by
/// its `L` duplicates at `z - k * spacing` plus jitter.
pub fn layer_points<R: Rng + ?Sized>(
    seeds: &[Vector3<f32>],
    layers: &LayerParams,
    rng: &mut R,
) -> Vec<Vector3<f32>> {
    if layers.count == 0 {
        return seeds.to_vec();
    }

    let mut out = Vec::with_capacity(seeds.len() * (layers.count + 1));
    for seed in seeds {
        out.push(*seed);
        for k in 1..=layers.count {
            out.push(Vector3::new(
                seed.x + symmetric(rng, layers.jitter_xy),
                seed.y + symmetric(rng, layers.jitter_xy),
                seed.z - k as f32 * layers.spacing + symmetric(rng, layers.jitter_z),
            ));
        }
    }
    out
}

/// Per-point linear RGB for `positions` under `mode`.
pub fn assign_colors<R: Rng + ?Sized>(
    positions: &[Vector3<f32>],
    mode: &ColorMode,
    rng: &mut R,
) -> Vec<Vector3<f32>> {
    match mode {
        ColorMode::Flat(color) => vec![color.clamped().0; positions.len()],
        ColorMode::Gradient { top, bottom } => {
            let (y_min, y_max) = positions
                .iter()
                .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), p| {
                    (lo.min(p.y), hi.max(p.y))
                });
            let y_range = y_max - y_min + Y_RANGE_EPS;

            positions
                .iter()
                .map(|p| {
                    let t = (p.y - y_min) / y_range;
                    let base = top.lerp(bottom, t).0;
                    let noise = Vector3::new(
                        symmetric(rng, COLOR_NOISE),
                        symmetric(rng, COLOR_NOISE),
                        symmetric(rng, COLOR_NOISE),
                    );
                    Rgb(base + noise).clamped().0
                })
                .collect()
        }
    }
}

/// Per-point linear scale. x and y share one multiplier; z has its own.
pub fn assign_scales<R: Rng + ?Sized>(
    n: usize,
    params: &ScaleParams,
    rng: &mut R,
) -> Vec<Vector3<f32>> {
    (0..n)
        .map(|_| {
            let xy = params.base_xy * rng.gen_range(XY_SCALE_RANGE.0..=XY_SCALE_RANGE.1);
            let z = params.base_z * rng.gen_range(Z_SCALE_RANGE.0..=Z_SCALE_RANGE.1);
            Vector3::new(xy, xy, z)
        })
        .collect()
}

/// Build the full linear point set from seed points.
pub fn synthesize<R: Rng + ?Sized>(
    seeds: &[Vector3<f32>],
    params: &SynthParams,
    rng: &mut R,
) -> SplatCloud {
    let positions = layer_points(seeds, &params.layers, rng);
    let colors = assign_colors(&positions, &params.color, rng);
    let scales = assign_scales(positions.len(), &params.scale, rng);
    let opacities = vec![params.opacity; positions.len()];

    debug!(
        seeds = seeds.len(),
        points = positions.len(),
        layers = params.layers.count,
        "synthesized geometry"
    );

    SplatCloud {
        positions,
        colors,
        opacities,
        scales,
    }
}

/// Uniform sample in `[-half_width, half_width]`.
fn symmetric<R: Rng + ?Sized>(rng: &mut R, half_width: f32) -> f32 {
    if half_width <= 0.0 {
        return 0.0;
    }
    rng.gen_range(-half_width..=half_width)
}
