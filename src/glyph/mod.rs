//! Text → coverage bitmap → seed points.
//!
//! - `raster`: the [`Rasterizer`] capability and bitmap composition
//! - `font`: font discovery ([`FontResolver`]) and the fontdue backend
//! - `builtin`: dependency-free bitmap font used as fallback
//! - `extract`: coverage bitmap → centered, jittered 3D seed points

mod builtin;
mod font;
mod raster;
pub mod extract;

pub use builtin::BuiltinRasterizer;
pub use extract::{decimate, extract_points, inked_pixels};
pub use font::{select_rasterizer, FontLoadDegraded, FontRasterizer, FontResolver};
pub use raster::{compose, fallback_dimensions, CoverageBitmap, PlacedGlyph, Rasterizer};
