//! End-to-end generation: text → bitmap → seeds → cloud → encoded → PLY.
//!
//! Every stage runs sequentially on one in-memory point set. Randomness comes
//! from a single generator threaded through extraction and synthesis, so a
//! fixed seed gives byte-identical output.

use crate::core::{EncodedCloud, SplatCloud};
use crate::error::SplatError;
use crate::glyph::{extract_points, CoverageBitmap, Rasterizer};
use crate::io::save_ply;
use crate::synth::{synthesize, SynthParams};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Largest accepted font size in pixels.
pub const MAX_FONT_SIZE: f32 = 2048.0;

/// All tunables of a generation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub text: String,

    /// Font size in pixels
    pub font_size: f32,

    /// Keep every `step`-th inked pixel
    pub step: usize,

    /// Layering, color, opacity and scale parameters
    #[serde(flatten)]
    pub synth: SynthParams,

    /// Seed for the random generator; `None` draws from OS entropy
    pub seed: Option<u64>,

    /// Optional font file tried before the platform candidates
    pub font: Option<PathBuf>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            text: "GaussForge".to_string(),
            font_size: 150.0,
            step: 2,
            synth: SynthParams::default(),
            seed: None,
            font: None,
        }
    }
}

impl GenerationConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, SplatError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every numeric tunable. The font size must be finite and in
    /// `(0, MAX_FONT_SIZE]`; see [`SynthParams::validate`] for the rest.
    pub fn validate(&self) -> Result<(), SplatError> {
        if !(self.font_size > 0.0 && self.font_size <= MAX_FONT_SIZE) {
            return Err(SplatError::parameter(
                "font_size",
                format!("{} is not inside (0, {MAX_FONT_SIZE}]", self.font_size),
            ));
        }
        self.synth.validate()
    }

    /// The generator this config asks for.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Everything a run produced, kept for reporting.
#[derive(Clone, Debug)]
pub struct Generated {
    pub bitmap: CoverageBitmap,
    /// Point count before layering
    pub seed_count: usize,
    pub cloud: SplatCloud,
    pub encoded: EncodedCloud,
}

/// Run the pipeline in memory.
///
/// The config is validated first; an invalid one fails before rasterizing.
pub fn generate<R: Rng + ?Sized>(
    config: &GenerationConfig,
    rasterizer: &dyn Rasterizer,
    rng: &mut R,
) -> Result<Generated, SplatError> {
    config.validate()?;
    let bitmap = rasterizer.rasterize(&config.text, config.font_size);
    let seeds = extract_points(&bitmap, config.step, rng)?;
    let cloud = synthesize(&seeds, &config.synth, rng);
    let encoded = cloud.encode()?;

    info!(
        rasterizer = rasterizer.name(),
        seeds = seeds.len(),
        points = cloud.len(),
        "generated splat cloud"
    );

    Ok(Generated {
        bitmap,
        seed_count: seeds.len(),
        cloud,
        encoded,
    })
}

/// Run the pipeline and write the result to `path`.
///
/// Nothing is created at `path` when any stage fails.
pub fn generate_to_file<R: Rng + ?Sized>(
    config: &GenerationConfig,
    rasterizer: &dyn Rasterizer,
    rng: &mut R,
    path: &Path,
) -> Result<Generated, SplatError> {
    let generated = generate(config, rasterizer, rng)?;
    save_ply(&generated.encoded, path)?;
    Ok(generated)
}
