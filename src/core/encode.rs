//! Storage-space encodings for splat attributes.
//!
//! Splat files never store "real" attribute values directly:
//! - Color is stored as the DC (degree-0) spherical harmonics coefficient
//! - Opacity is stored pre-sigmoid (logit)
//! - Scale is stored in log-space
//!
//! Each encoder has a matching decoder so consumers (and tests) can recover
//! the linear value.

use nalgebra::Vector3;

/// Y_0^0, the constant degree-0 spherical harmonics basis function.
pub const SH_C0: f32 = 0.282_094_8;

/// Number of higher-order SH coefficients carried per point (degree 3, RGB).
pub const SH_REST_COUNT: usize = 45;

/// The higher-order SH block. No view-dependent color is modeled, so it is
/// always zero.
pub const SH_REST_ZERO: [f32; SH_REST_COUNT] = [0.0; SH_REST_COUNT];

/// Opacity is clamped to `[OPACITY_EPS, 1 - OPACITY_EPS]` before the logit.
pub const OPACITY_EPS: f32 = 1e-6;

/// Smallest linear scale accepted by [`encode_scale`].
pub const MIN_SCALE: f32 = 1e-8;

/// Identity quaternion in (w, x, y, z) order.
pub const IDENTITY_ROTATION: [f32; 4] = [1.0, 0.0, 0.0, 0.0];

/// Every point faces +z.
pub const FLAT_NORMAL: [f32; 3] = [0.0, 0.0, 1.0];

/// Linear color channel in [0, 1] → SH DC coefficient.
///
/// `f = (c - 0.5) / C0`
pub fn encode_color(c: f32) -> f32 {
    (c - 0.5) / SH_C0
}

/// SH DC coefficient → linear color channel.
pub fn decode_color(f: f32) -> f32 {
    SH_C0 * f + 0.5
}

/// Encode an RGB triple channel by channel.
pub fn encode_rgb(rgb: &Vector3<f32>) -> [f32; 3] {
    [encode_color(rgb.x), encode_color(rgb.y), encode_color(rgb.z)]
}

/// Inverse sigmoid (logit): logit(p) = log(p / (1-p))
///
/// Maps (0, 1) → R. The input is clamped first so the boundary never
/// produces an infinite logit.
pub fn encode_opacity(p: f32) -> f32 {
    let p_clamped = p.clamp(OPACITY_EPS, 1.0 - OPACITY_EPS);
    (p_clamped / (1.0 - p_clamped)).ln()
}

/// Sigmoid activation: σ(x) = 1 / (1 + e^(-x))
pub fn decode_opacity(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Linear scale → log-space. Non-positive input is floored at [`MIN_SCALE`].
pub fn encode_scale(s: f32) -> f32 {
    s.max(MIN_SCALE).ln()
}

pub fn decode_scale(s: f32) -> f32 {
    s.exp()
}

/// Encode a per-axis scale vector.
pub fn encode_scale3(scale: &Vector3<f32>) -> [f32; 3] {
    [
        encode_scale(scale.x),
        encode_scale(scale.y),
        encode_scale(scale.z),
    ]
}
