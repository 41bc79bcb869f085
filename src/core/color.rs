//! Color parsing and gradient helpers.
//!
//! Colors are handled as RGB triples in [0, 1]. Hex channels are divided by
//! 255 and used as-is: no transfer function is applied before the SH DC
//! encoding, so `#FFFFFF` encodes to exactly `(1 - 0.5) / C0` per channel.

use crate::error::SplatError;
use nalgebra::Vector3;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// An RGB color with channels in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgb(pub Vector3<f32>);

impl Rgb {
    pub fn white() -> Self {
        Rgb::new(1.0, 1.0, 1.0)
    }

    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Rgb(Vector3::new(r, g, b))
    }

    /// Parse `#RRGGBB` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Result<Self, SplatError> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(SplatError::InvalidColor(hex.to_string()));
        }

        let channel = |range: std::ops::Range<usize>| -> Result<f32, SplatError> {
            u8::from_str_radix(&digits[range], 16)
                .map(|v| v as f32 / 255.0)
                .map_err(|_| SplatError::InvalidColor(hex.to_string()))
        };

        Ok(Rgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Format back to `#RRGGBB`, rounding each channel to the nearest byte.
    pub fn to_hex(&self) -> String {
        let byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02X}{:02X}{:02X}", byte(self.0.x), byte(self.0.y), byte(self.0.z))
    }

    /// Linear interpolation: `t = 0` gives `self`, `t = 1` gives `other`.
    pub fn lerp(&self, other: &Rgb, t: f32) -> Rgb {
        Rgb(self.0 * (1.0 - t) + other.0 * t)
    }

    /// Clamp every channel to [0, 1].
    pub fn clamped(&self) -> Rgb {
        Rgb(self.0.map(|c| c.clamp(0.0, 1.0)))
    }
}

impl FromStr for Rgb {
    type Err = SplatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rgb::from_hex(s)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// Config files spell colors the same way the command line does.
impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Rgb::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}
