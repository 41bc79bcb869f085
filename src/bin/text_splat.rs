//! text-splat: Generate a Gaussian-splat PLY from text
//!
//! Usage:
//!   text-splat "Hello" -o hello.ply
//!   text-splat "Hello" -o out.ply --step 3 --color-top "#87CEEB" --color-bottom "#FFD700"
//!   text-splat "Hello" -o out.ply --step 2 --color "#FFFFFF"   # solid color, no gradient

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use text_splat::core::Rgb;
use text_splat::glyph::{select_rasterizer, FontResolver};
use text_splat::io::{ConversionCore, PlyLoopbackCore};
use text_splat::pipeline::{generate_to_file, GenerationConfig, MAX_FONT_SIZE};
use text_splat::synth::ColorMode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "text-splat", version, about = "Generate a Gaussian-splat PLY from text")]
struct Cli {
    /// Text to render [default: GaussForge]
    text: Option<String>,

    /// Output PLY path
    #[arg(short = 'o', long = "output", default_value = "output_gaussians.ply")]
    output: PathBuf,

    /// Font file (TTF/OTF); platform fonts are probed when omitted
    #[arg(long)]
    font: Option<PathBuf>,

    /// Font size in pixels, up to 2048 [default: 150]
    #[arg(long, value_parser = parse_font_size)]
    size: Option<f32>,

    /// Keep every N-th inked pixel [default: 2]
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    step: Option<u32>,

    /// Solid color for every point as strict #RRGGBB; disables the gradient
    #[arg(long)]
    color: Option<Rgb>,

    /// Gradient color at the top of the text, #RRGGBB [default: #87CEEB]
    #[arg(long = "color-top")]
    color_top: Option<Rgb>,

    /// Gradient color at the bottom of the text, #RRGGBB [default: #FFD700]
    #[arg(long = "color-bottom")]
    color_bottom: Option<Rgb>,

    /// Opacity in (0, 1) [default: 0.95]
    #[arg(long)]
    opacity: Option<f32>,

    /// Extra layers stacked behind the text [default: 0]
    #[arg(long)]
    layers: Option<usize>,

    /// Distance between layers [default: 0.1]
    #[arg(long = "layer-spacing")]
    layer_spacing: Option<f32>,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// JSON file with generation settings; flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also save the coverage bitmap as PNG
    #[arg(long = "mask-out")]
    mask_out: Option<PathBuf>,

    /// Print model info of the written file as JSON
    #[arg(long)]
    info: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    /// Merge flags over the config file (or the defaults).
    fn to_config(&self) -> anyhow::Result<GenerationConfig> {
        let mut config = match &self.config {
            Some(path) => GenerationConfig::from_json_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => GenerationConfig::default(),
        };

        if let Some(text) = &self.text {
            config.text = text.clone();
        }
        if let Some(font) = &self.font {
            config.font = Some(font.clone());
        }
        if let Some(size) = self.size {
            config.font_size = size;
        }
        if let Some(step) = self.step {
            config.step = step as usize;
        }
        if let Some(opacity) = self.opacity {
            config.synth.opacity = opacity;
        }
        if let Some(layers) = self.layers {
            config.synth.layers.count = layers;
        }
        if let Some(spacing) = self.layer_spacing {
            config.synth.layers.spacing = spacing;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }

        config.synth.color = match (self.color, self.color_top, self.color_bottom) {
            (Some(flat), _, _) => ColorMode::Flat(flat),
            (None, None, None) => config.synth.color,
            (None, top, bottom) => {
                let (default_top, default_bottom) = match (config.synth.color, ColorMode::default()) {
                    (ColorMode::Gradient { top, bottom }, _) => (top, bottom),
                    (_, ColorMode::Gradient { top, bottom }) => (top, bottom),
                    (_, ColorMode::Flat(c)) => (c, c),
                };
                ColorMode::Gradient {
                    top: top.unwrap_or(default_top),
                    bottom: bottom.unwrap_or(default_bottom),
                }
            }
        };

        config.validate()?;
        Ok(config)
    }
}

fn parse_font_size(s: &str) -> Result<f32, String> {
    let size: f32 = s.parse().map_err(|e| format!("{e}"))?;
    if size > 0.0 && size <= MAX_FONT_SIZE {
        Ok(size)
    } else {
        Err(format!("font size must be in (0, {MAX_FONT_SIZE}]"))
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = cli.to_config()?;

    let mut resolver = FontResolver::system();
    if let Some(font) = &config.font {
        resolver = resolver.prefer(font.clone());
    }
    let (rasterizer, _degraded) = select_rasterizer(&resolver);

    let mut rng = config.rng();
    let generated = generate_to_file(&config, rasterizer.as_ref(), &mut rng, &cli.output)?;

    if let Some(mask_path) = &cli.mask_out {
        generated
            .bitmap
            .save(mask_path)
            .with_context(|| format!("saving coverage mask {}", mask_path.display()))?;
    }

    let mode = match config.synth.color {
        ColorMode::Gradient { top, bottom } => format!("gradient {top}->{bottom}"),
        ColorMode::Flat(c) => format!("flat {c}"),
    };
    println!(
        "Generated {} Gaussian points -> {} (step={}, {})",
        generated.encoded.len(),
        cli.output.display(),
        config.step,
        mode
    );

    if cli.info {
        let bytes = std::fs::read(&cli.output)?;
        let info = PlyLoopbackCore
            .model_info(&bytes, "ply", bytes.len())
            .map_err(anyhow::Error::new)?;
        println!("{}", serde_json::to_string_pretty(&info)?);
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}
