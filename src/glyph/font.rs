//! Font discovery and the fontdue-backed rasterizer.
//!
//! Font selection never fails a run: every problem (nothing installed, file
//! unreadable, file not a font) is reported as a [`FontLoadDegraded`] value and
//! the [`BuiltinRasterizer`] takes over.

use crate::glyph::builtin::BuiltinRasterizer;
use crate::glyph::raster::{compose, CoverageBitmap, PlacedGlyph, Rasterizer};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Platform font files probed when no font is given explicitly.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/System/Library/Fonts/Helvetica.ttc",
    "/System/Library/Fonts/SFNSText.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
];

/// Ranked list of font file candidates. The first one that exists wins.
#[derive(Clone, Debug, Default)]
pub struct FontResolver {
    candidates: Vec<PathBuf>,
    /// Font the caller asked for explicitly
    preferred: Option<PathBuf>,
}

impl FontResolver {
    /// A resolver with no candidates; always falls back to the built-in font.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resolver over the platform font locations.
    pub fn system() -> Self {
        Self::from_candidates(SYSTEM_FONT_CANDIDATES)
    }

    pub fn from_candidates<I, P>(candidates: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            candidates: candidates.into_iter().map(Into::into).collect(),
            preferred: None,
        }
    }

    /// Put `path` ahead of every other candidate. If it turns out to be
    /// missing, [`select_rasterizer`] reports that as a degradation.
    pub fn prefer(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.candidates.insert(0, path.clone());
        self.preferred = Some(path);
        self
    }

    pub fn preferred(&self) -> Option<&Path> {
        self.preferred.as_deref()
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// First candidate that exists as a regular file.
    pub fn resolve(&self) -> Option<&Path> {
        self.candidates
            .iter()
            .map(PathBuf::as_path)
            .find(|p| p.is_file())
    }
}

/// Why the built-in rasterizer was substituted for a real font.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FontLoadDegraded {
    /// None of the candidate paths exists.
    NoCandidate,
    /// The font file exists but could not be read.
    Unreadable { path: PathBuf, reason: String },
    /// The file was read but is not a usable font.
    Unparseable { path: PathBuf, reason: String },
}

impl fmt::Display for FontLoadDegraded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontLoadDegraded::NoCandidate => write!(f, "no font file found"),
            FontLoadDegraded::Unreadable { path, reason } => {
                write!(f, "cannot read font {}: {}", path.display(), reason)
            }
            FontLoadDegraded::Unparseable { path, reason } => {
                write!(f, "cannot parse font {}: {}", path.display(), reason)
            }
        }
    }
}

/// Rasterizer driven by a TrueType/OpenType font through fontdue.
pub struct FontRasterizer {
    font: fontdue::Font,
    name: String,
}

impl FontRasterizer {
    pub fn from_bytes(bytes: &[u8], name: impl Into<String>) -> Result<Self, String> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| e.to_string())?;
        Ok(Self {
            font,
            name: name.into(),
        })
    }

    /// Load a font file, classifying failures as [`FontLoadDegraded`].
    pub fn load(path: &Path) -> Result<Self, FontLoadDegraded> {
        let bytes = std::fs::read(path).map_err(|e| FontLoadDegraded::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_bytes(&bytes, name).map_err(|reason| FontLoadDegraded::Unparseable {
            path: path.to_path_buf(),
            reason,
        })
    }
}

impl Rasterizer for FontRasterizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn rasterize(&self, text: &str, size: f32) -> CoverageBitmap {
        let (ascent, line_height) = match self.font.horizontal_line_metrics(size) {
            Some(m) => (m.ascent, m.new_line_size),
            None => (size * 0.8, size * 1.2),
        };

        let mut glyphs = Vec::with_capacity(text.len());
        for (line_idx, line) in text.split('\n').enumerate() {
            let baseline = ascent + line_idx as f32 * line_height;
            let mut pen_x = 0.0f32;
            let mut prev: Option<char> = None;

            for ch in line.chars() {
                if let Some(left) = prev {
                    pen_x += self.font.horizontal_kern(left, ch, size).unwrap_or(0.0);
                }
                let (metrics, coverage) = self.font.rasterize(ch, size);
                glyphs.push(PlacedGlyph {
                    x: pen_x.round() as i32 + metrics.xmin,
                    y: (baseline - (metrics.ymin + metrics.height as i32) as f32).round() as i32,
                    width: metrics.width,
                    height: metrics.height,
                    coverage,
                });
                pen_x += metrics.advance_width;
                prev = Some(ch);
            }
        }

        compose(&glyphs, text, size)
    }
}

/// Pick a rasterizer from the resolver's candidates.
///
/// Returns the built-in rasterizer together with the reason whenever no
/// candidate yields a usable font. A preferred font that does not exist is
/// reported as [`FontLoadDegraded::Unreadable`] even when a platform font
/// takes its place. Every degradation is logged.
pub fn select_rasterizer(
    resolver: &FontResolver,
) -> (Box<dyn Rasterizer>, Option<FontLoadDegraded>) {
    let missing_preferred = resolver
        .preferred()
        .filter(|p| !p.is_file())
        .map(|path| FontLoadDegraded::Unreadable {
            path: path.to_path_buf(),
            reason: "no such file".to_string(),
        });
    if let Some(degraded) = &missing_preferred {
        warn!(reason = %degraded, "requested font unavailable, trying platform fonts");
    }

    let outcome = match resolver.resolve() {
        Some(path) => {
            debug!(path = %path.display(), "loading font");
            FontRasterizer::load(path)
        }
        None => Err(FontLoadDegraded::NoCandidate),
    };

    match outcome {
        Ok(rasterizer) => {
            info!(font = rasterizer.name(), "using font rasterizer");
            (Box::new(rasterizer), missing_preferred)
        }
        Err(degraded) => {
            warn!(reason = %degraded, "font unavailable, using built-in bitmap font");
            (Box::new(BuiltinRasterizer), Some(missing_preferred.unwrap_or(degraded)))
        }
    }
}
