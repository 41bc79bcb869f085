//! Contract with the splat conversion core, plus a PLY-only loopback.
//!
//! The conversion core (PLY ↔ SPLAT/KSPLAT/SPZ/SOG/...) lives outside this
//! crate. Generated files only need to be valid `"ply"` input to it, so the
//! contract is modeled as the [`ConversionCore`] trait. [`PlyLoopbackCore`]
//! implements it for the fixed schema written by [`crate::io::ply`], which
//! lets the pipeline (and tests) check its own output the way the core
//! would see it.

use crate::core::{EncodedCloud, SH_REST_COUNT};
use crate::io::ply::{encode_ply, read_ply};
use serde::Serialize;
use std::fmt;

/// Format name of the Gaussian-splat PLY this crate writes.
pub const PLY_FORMAT: &str = "ply";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CoreErrorKind {
    /// No reader or writer registered for the format.
    UnsupportedFormat,
    /// The input bytes could not be decoded.
    Decode,
    /// The decoded cloud could not be re-encoded.
    Encode,
}

/// Error half of every collaborator result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CoreError {
    pub kind: CoreErrorKind,
    pub message: String,
}

impl CoreError {
    pub fn new(kind: CoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    fn unsupported(format: &str) -> Self {
        Self::new(
            CoreErrorKind::UnsupportedFormat,
            format!("No reader for {format}"),
        )
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for CoreError {}

pub type CoreResult<T> = Result<T, CoreError>;

/// Metadata reported by `read`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudMeta {
    pub sh_degree: u32,
    pub source_format: String,
}

/// Successful `read` payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadSummary {
    pub num_points: usize,
    pub meta: CloudMeta,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicInfo {
    pub num_points: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<usize>,
    pub source_format: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderingInfo {
    pub sh_degree: u32,
    pub antialiased: bool,
}

/// Axis-aligned bounds, each axis as `[min, max]`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Bounds {
    pub x: [f32; 2],
    pub y: [f32; 2],
    pub z: [f32; 2],
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FloatStats {
    pub min: f32,
    pub max: f32,
    pub avg: f32,
    #[serde(skip)]
    pub count: usize,
}

impl FloatStats {
    /// `None` for an empty input.
    pub fn from_values<I: IntoIterator<Item = f32>>(values: I) -> Option<Self> {
        let mut iter = values.into_iter();
        let first = iter.next()?;
        let (mut min, mut max, mut sum, mut count) = (first, first, first as f64, 1usize);
        for v in iter {
            min = min.min(v);
            max = max.max(v);
            sum += v as f64;
            count += 1;
        }
        Some(Self {
            min,
            max,
            avg: (sum / count as f64) as f32,
            count,
        })
    }
}

/// Byte-size breakdown, formatted the way the core reports it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SizeBreakdown {
    pub positions: String,
    pub scales: String,
    pub rotations: String,
    pub alphas: String,
    pub colors: String,
    pub sh: String,
    pub total: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub basic: BasicInfo,
    pub rendering: RenderingInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_stats: Option<FloatStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha_stats: Option<FloatStats>,
    pub sizes: SizeBreakdown,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra_attrs: Vec<(String, String)>,
}

/// The four operations the external conversion core exposes.
pub trait ConversionCore {
    fn read(&self, bytes: &[u8], source_format: &str) -> CoreResult<ReadSummary>;

    fn convert(&self, bytes: &[u8], source_format: &str, target_format: &str)
        -> CoreResult<Vec<u8>>;

    fn model_info(&self, bytes: &[u8], format: &str, byte_length: usize)
        -> CoreResult<ModelInfo>;

    fn supported_formats(&self) -> Vec<String>;
}

/// SH degree implied by the number of higher-order coefficients per point.
pub fn sh_degree_for_rest_count(rest: usize) -> u32 {
    match rest / 3 {
        0 => 0,
        3 => 1,
        8 => 2,
        15 => 3,
        _ => 0,
    }
}

/// Human-readable byte count: B, KB, MB or GB with two decimals.
pub fn format_bytes(bytes: usize) -> String {
    const SUFFIX: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut exp = 0;
    while value >= 1024.0 && exp < SUFFIX.len() - 1 {
        value /= 1024.0;
        exp += 1;
    }
    format!("{value:.2} {}", SUFFIX[exp])
}

/// [`ConversionCore`] for the crate's own PLY schema.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlyLoopbackCore;

impl PlyLoopbackCore {
    fn decode(&self, bytes: &[u8], format: &str) -> CoreResult<EncodedCloud> {
        if format != PLY_FORMAT {
            return Err(CoreError::unsupported(format));
        }
        read_ply(bytes).map_err(|e| CoreError::new(CoreErrorKind::Decode, e.to_string()))
    }
}

impl ConversionCore for PlyLoopbackCore {
    fn read(&self, bytes: &[u8], source_format: &str) -> CoreResult<ReadSummary> {
        let cloud = self.decode(bytes, source_format)?;
        Ok(ReadSummary {
            num_points: cloud.len(),
            meta: CloudMeta {
                sh_degree: sh_degree_for_rest_count(SH_REST_COUNT),
                source_format: source_format.to_string(),
            },
        })
    }

    fn convert(
        &self,
        bytes: &[u8],
        source_format: &str,
        target_format: &str,
    ) -> CoreResult<Vec<u8>> {
        let cloud = self.decode(bytes, source_format)?;
        if target_format != PLY_FORMAT {
            return Err(CoreError::new(
                CoreErrorKind::UnsupportedFormat,
                format!("No writer for {target_format}"),
            ));
        }
        encode_ply(&cloud).map_err(|e| CoreError::new(CoreErrorKind::Encode, e.to_string()))
    }

    fn model_info(&self, bytes: &[u8], format: &str, byte_length: usize) -> CoreResult<ModelInfo> {
        let cloud = self.decode(bytes, format)?;
        let n = cloud.len();
        let float = std::mem::size_of::<f32>();

        let bounds = FloatStats::from_values(cloud.positions.iter().map(|p| p[0])).map(|x| {
            let axis = |i: usize| {
                let s = FloatStats::from_values(cloud.positions.iter().map(|p| p[i]));
                s.map(|s| [s.min, s.max]).unwrap_or([0.0; 2])
            };
            Bounds {
                x: [x.min, x.max],
                y: axis(1),
                z: axis(2),
            }
        });

        let positions = n * 3 * float;
        let scales = n * 3 * float;
        let rotations = n * 4 * float;
        let alphas = n * float;
        let colors = n * 3 * float;
        let sh = n * SH_REST_COUNT * float;

        Ok(ModelInfo {
            basic: BasicInfo {
                num_points: n,
                file_size: (byte_length > 0).then_some(byte_length),
                source_format: format.to_string(),
            },
            rendering: RenderingInfo {
                sh_degree: sh_degree_for_rest_count(SH_REST_COUNT),
                antialiased: false,
            },
            bounds,
            scale_stats: FloatStats::from_values(cloud.scales.iter().flatten().copied()),
            alpha_stats: FloatStats::from_values(cloud.opacities.iter().copied()),
            sizes: SizeBreakdown {
                positions: format_bytes(positions),
                scales: format_bytes(scales),
                rotations: format_bytes(rotations),
                alphas: format_bytes(alphas),
                colors: format_bytes(colors),
                sh: format_bytes(sh),
                total: format_bytes(positions + scales + rotations + alphas + colors + sh),
            },
            extra_attrs: Vec::new(),
        })
    }

    fn supported_formats(&self) -> Vec<String> {
        vec![PLY_FORMAT.to_string()]
    }
}
