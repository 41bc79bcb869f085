//! Point cloud containers.
//!
//! A cloud lives in two forms:
//! - [`SplatCloud`]: linear attributes as synthesized (RGB in [0, 1],
//!   opacity as a probability, positive per-axis scale)
//! - [`EncodedCloud`]: storage-space attributes, ready for the PLY writer
//!
//! Both use Struct-of-Arrays layout. Index `i` in every array describes the
//! same point, and point order is preserved from extraction to the file.

use crate::core::encode::{
    encode_opacity, encode_rgb, encode_scale3, FLAT_NORMAL, IDENTITY_ROTATION, SH_REST_COUNT,
    SH_REST_ZERO,
};
use crate::error::SplatError;
use nalgebra::Vector3;

/// Synthesized points with linear attributes.
#[derive(Clone, Debug, Default)]
pub struct SplatCloud {
    /// World-space positions
    pub positions: Vec<Vector3<f32>>,

    /// RGB, each channel in [0, 1]
    pub colors: Vec<Vector3<f32>>,

    /// Opacity probability in (0, 1)
    pub opacities: Vec<f32>,

    /// Linear per-axis scale, strictly positive
    pub scales: Vec<Vector3<f32>>,
}

impl SplatCloud {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of points, taken from the position array.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Check that every attribute array holds exactly one entry per position.
    pub fn validate(&self) -> Result<(), SplatError> {
        let n = self.positions.len();
        check_len("colors", n, self.colors.len())?;
        check_len("opacities", n, self.opacities.len())?;
        check_len("scales", n, self.scales.len())?;
        Ok(())
    }

    /// Apply the storage-space encodings to every point.
    pub fn encode(&self) -> Result<EncodedCloud, SplatError> {
        self.validate()?;

        Ok(EncodedCloud {
            positions: self.positions.iter().map(|p| [p.x, p.y, p.z]).collect(),
            f_dc: self.colors.iter().map(encode_rgb).collect(),
            opacities: self.opacities.iter().copied().map(encode_opacity).collect(),
            scales: self.scales.iter().map(encode_scale3).collect(),
        })
    }
}

/// Encoded per-point attributes.
///
/// Normals, rotations and the higher-order SH block are constant for every
/// point and are not stored per point; see [`SplatRecord`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EncodedCloud {
    pub positions: Vec<[f32; 3]>,

    /// SH DC coefficients
    pub f_dc: Vec<[f32; 3]>,

    /// Logit opacity
    pub opacities: Vec<f32>,

    /// Log-space scale
    pub scales: Vec<[f32; 3]>,
}

impl EncodedCloud {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn validate(&self) -> Result<(), SplatError> {
        let n = self.positions.len();
        check_len("f_dc", n, self.f_dc.len())?;
        check_len("opacity", n, self.opacities.len())?;
        check_len("scale", n, self.scales.len())?;
        Ok(())
    }

    /// Assemble the full record for point `i`.
    ///
    /// Panics if `i` is out of bounds; call [`EncodedCloud::validate`] first.
    pub fn record(&self, i: usize) -> SplatRecord {
        SplatRecord {
            position: self.positions[i],
            normal: FLAT_NORMAL,
            f_dc: self.f_dc[i],
            f_rest: SH_REST_ZERO,
            opacity: self.opacities[i],
            scale: self.scales[i],
            rotation: IDENTITY_ROTATION,
        }
    }

    /// Iterate over full records in point order.
    pub fn records(&self) -> impl Iterator<Item = SplatRecord> + '_ {
        (0..self.len()).map(move |i| self.record(i))
    }
}

/// One complete on-disk vertex: 62 floats in file order.
#[derive(Clone, Debug, PartialEq)]
pub struct SplatRecord {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub f_dc: [f32; 3],
    pub f_rest: [f32; SH_REST_COUNT],
    pub opacity: f32,
    pub scale: [f32; 3],
    /// Quaternion (w, x, y, z)
    pub rotation: [f32; 4],
}

impl SplatRecord {
    /// Number of float fields in a record.
    pub const FIELD_COUNT: usize = 3 + 3 + 3 + SH_REST_COUNT + 1 + 3 + 4;

    /// Flatten into file order: position, normal, f_dc, f_rest, opacity,
    /// scale, rotation.
    pub fn to_fields(&self) -> [f32; Self::FIELD_COUNT] {
        let mut fields = [0.0f32; Self::FIELD_COUNT];
        let parts: [&[f32]; 7] = [
            &self.position,
            &self.normal,
            &self.f_dc,
            &self.f_rest,
            std::slice::from_ref(&self.opacity),
            &self.scale,
            &self.rotation,
        ];

        let mut offset = 0;
        for part in parts {
            fields[offset..offset + part.len()].copy_from_slice(part);
            offset += part.len();
        }
        fields
    }

    /// Inverse of [`SplatRecord::to_fields`].
    pub fn from_fields(fields: &[f32; Self::FIELD_COUNT]) -> Self {
        const REST: usize = 9;
        const OPACITY: usize = REST + SH_REST_COUNT;
        const SCALE: usize = OPACITY + 1;
        const ROT: usize = SCALE + 3;

        let mut record = SplatRecord {
            position: [0.0; 3],
            normal: [0.0; 3],
            f_dc: [0.0; 3],
            f_rest: SH_REST_ZERO,
            opacity: fields[OPACITY],
            scale: [0.0; 3],
            rotation: [0.0; 4],
        };
        record.position.copy_from_slice(&fields[0..3]);
        record.normal.copy_from_slice(&fields[3..6]);
        record.f_dc.copy_from_slice(&fields[6..REST]);
        record.f_rest.copy_from_slice(&fields[REST..OPACITY]);
        record.scale.copy_from_slice(&fields[SCALE..ROT]);
        record.rotation.copy_from_slice(&fields[ROT..Self::FIELD_COUNT]);
        record
    }
}

fn check_len(field: &'static str, expected: usize, got: usize) -> Result<(), SplatError> {
    if got != expected {
        return Err(SplatError::InvalidGeometry {
            field,
            expected,
            got,
        });
    }
    Ok(())
}
