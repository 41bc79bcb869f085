//! Generated files as seen by the conversion core
//!
//! Runs the pipeline, then feeds the written bytes back through
//! [`PlyLoopbackCore`] the way a downstream converter would receive them.

use approx::assert_relative_eq;
use rand::SeedableRng;
use rand::rngs::StdRng;
use text_splat::core::{decode_opacity, Rgb};
use text_splat::glyph::BuiltinRasterizer;
use text_splat::io::{ConversionCore, CoreErrorKind, PlyLoopbackCore};
use text_splat::pipeline::{generate_to_file, GenerationConfig};
use text_splat::synth::{ColorMode, SynthParams};

fn generated_bytes() -> (Vec<u8>, usize) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("core.ply");
    let config = GenerationConfig {
        text: "Core".to_string(),
        font_size: 8.0,
        step: 1,
        synth: SynthParams::new(ColorMode::Flat(Rgb::white()), 0.8),
        ..Default::default()
    };
    let mut rng = StdRng::seed_from_u64(5);
    let generated = generate_to_file(&config, &BuiltinRasterizer, &mut rng, &path).unwrap();
    (std::fs::read(&path).unwrap(), generated.encoded.len())
}

#[test]
fn test_core_reads_generated_file() {
    let (bytes, n) = generated_bytes();
    let core = PlyLoopbackCore;

    let summary = core.read(&bytes, "ply").unwrap();
    assert_eq!(summary.num_points, n);
    assert_eq!(summary.meta.sh_degree, 3);
    assert_eq!(core.supported_formats(), vec!["ply".to_string()]);
}

#[test]
fn test_core_model_info() {
    let (bytes, n) = generated_bytes();
    let info = PlyLoopbackCore.model_info(&bytes, "ply", bytes.len()).unwrap();

    assert_eq!(info.basic.num_points, n);
    assert_eq!(info.basic.file_size, Some(bytes.len()));
    assert_eq!(info.rendering.sh_degree, 3);

    let alpha = info.alpha_stats.as_ref().expect("alpha stats");
    assert_relative_eq!(decode_opacity(alpha.min), 0.8, epsilon = 1e-5);
    assert_relative_eq!(decode_opacity(alpha.max), 0.8, epsilon = 1e-5);

    let bounds = info.bounds.as_ref().expect("bounds");
    assert!(bounds.x[0] < 0.0 && bounds.x[1] > 0.0);
    assert!(bounds.z[0] >= -0.004 - 1e-6 && bounds.z[1] <= 0.004 + 1e-6);

    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json["basic"]["numPoints"], n);
    assert!(json["sizes"]["total"].as_str().unwrap().ends_with('B'));
}

#[test]
fn test_core_convert_loopback_is_identity() {
    let (bytes, _) = generated_bytes();
    let out = PlyLoopbackCore.convert(&bytes, "ply", "ply").unwrap();
    assert_eq!(out, bytes);
}

#[test]
fn test_core_rejects_other_formats() {
    let (bytes, _) = generated_bytes();
    let core = PlyLoopbackCore;

    let err = core.read(&bytes, "spz").unwrap_err();
    assert_eq!(err.kind, CoreErrorKind::UnsupportedFormat);

    let err = core.convert(&bytes, "ply", "ksplat").unwrap_err();
    assert_eq!(err.kind, CoreErrorKind::UnsupportedFormat);

    let err = core.read(b"not a ply", "ply").unwrap_err();
    assert_eq!(err.kind, CoreErrorKind::Decode);
}
