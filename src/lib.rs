//! # text-splat: Gaussian-splat point clouds from text
//!
//! This crate renders text to a coverage bitmap, turns the inked pixels into a
//! synthetic 3D point set, and writes it as a binary Gaussian-splat PLY that
//! splat renderers and format converters can consume.
//!
//! ## Architecture
//!
//! - `glyph`: rasterization (font or built-in bitmap font) and seed point extraction
//! - `synth`: layering, color and scale synthesis
//! - `core`: point containers and the storage-space encodings (SH DC, logit, log-scale)
//! - `io`: the fixed 62-property PLY schema and the conversion-core contract
//! - `pipeline`: configuration and the end-to-end run
//!
//! ## Example
//!
//! ```
//! use rand::SeedableRng;
//! use text_splat::glyph::BuiltinRasterizer;
//! use text_splat::pipeline::{generate, GenerationConfig};
//!
//! let config = GenerationConfig { text: "Hi".into(), font_size: 16.0, ..Default::default() };
//! let mut rng = rand::rngs::StdRng::seed_from_u64(1);
//! let generated = generate(&config, &BuiltinRasterizer, &mut rng).unwrap();
//! assert!(!generated.encoded.is_empty());
//! ```

// Point containers and encodings
pub mod core;

pub mod error;

// Text rasterization and seed extraction
pub mod glyph;

// PLY output and the conversion-core contract
pub mod io;

pub mod pipeline;

pub mod synth;

// Re-export commonly used types at crate root for convenience
pub use core::{EncodedCloud, SplatCloud};
pub use error::SplatError;
pub use pipeline::{generate, generate_to_file, GenerationConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
