//! I/O operations for splat output.
//!
//! - `ply`: the fixed Gaussian-splat PLY schema (writer and schema-checked reader)
//! - `convert`: the contract with the external conversion core

pub mod convert;
mod ply;

pub use convert::{ConversionCore, CoreError, CoreErrorKind, ModelInfo, PlyLoopbackCore};
pub use ply::{
    encode_ply, header, property_names, read_ply, read_records, save_ply, write_ply, RECORD_SIZE,
};
