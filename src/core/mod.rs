//! Core data structures and attribute encodings.
//!
//! - `SplatCloud` / `EncodedCloud`: per-point attributes before and after encoding
//! - `encode`: SH DC, logit opacity and log-scale transforms
//! - `color`: hex colors and gradient interpolation
//!
//! All types here are "pure data" - no I/O, no randomness.

mod cloud;
pub mod color;
pub mod encode;

pub use cloud::{EncodedCloud, SplatCloud, SplatRecord};
pub use color::Rgb;
pub use encode::{
    decode_color, decode_opacity, decode_scale, encode_color, encode_opacity, encode_scale,
    FLAT_NORMAL, IDENTITY_ROTATION, SH_C0, SH_REST_COUNT,
};
