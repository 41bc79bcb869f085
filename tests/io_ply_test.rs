//! PLY I/O tests
//!
//! Checks the byte layout of generated files against the fixed
//! 62-property Gaussian-splat schema.

use byteorder::{ByteOrder, LittleEndian};
use rand::SeedableRng;
use rand::rngs::StdRng;
use text_splat::core::EncodedCloud;
use text_splat::glyph::BuiltinRasterizer;
use text_splat::io::{property_names, read_ply, save_ply, RECORD_SIZE};
use text_splat::pipeline::{generate_to_file, GenerationConfig};
use text_splat::SplatError;

const END_HEADER: &[u8] = b"end_header\n";

fn split_header(bytes: &[u8]) -> (&str, &[u8]) {
    let end = bytes
        .windows(END_HEADER.len())
        .position(|w| w == END_HEADER)
        .expect("header terminator")
        + END_HEADER.len();
    (std::str::from_utf8(&bytes[..end]).unwrap(), &bytes[end..])
}

#[test]
fn test_generated_file_matches_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("schema.ply");
    let config = GenerationConfig {
        text: "PLY".to_string(),
        font_size: 16.0,
        step: 3,
        ..Default::default()
    };
    let mut rng = StdRng::seed_from_u64(11);
    let generated = generate_to_file(&config, &BuiltinRasterizer, &mut rng, &path).unwrap();
    let n = generated.encoded.len();

    let bytes = std::fs::read(&path).unwrap();
    let (header, body) = split_header(&bytes);
    let lines: Vec<&str> = header.lines().collect();

    assert_eq!(lines[0], "ply");
    assert_eq!(lines[1], "format binary_little_endian 1.0");
    assert!(lines.contains(&format!("element vertex {n}").as_str()));

    let props: Vec<&str> = lines
        .iter()
        .filter_map(|l| l.strip_prefix("property float "))
        .collect();
    assert_eq!(props.len(), 62);
    assert_eq!(props[..9], ["x", "y", "z", "nx", "ny", "nz", "f_dc_0", "f_dc_1", "f_dc_2"]);
    assert_eq!(props[9], "f_rest_0");
    assert_eq!(props[53], "f_rest_44");
    assert_eq!(props[54..], ["opacity", "scale_0", "scale_1", "scale_2", "rot_0", "rot_1", "rot_2", "rot_3"]);
    assert_eq!(props, property_names().iter().map(String::as_str).collect::<Vec<_>>());

    assert_eq!(RECORD_SIZE, 248);
    assert_eq!(body.len(), n * 248);
}

#[test]
fn test_record_layout_in_raw_bytes() {
    let cloud = EncodedCloud {
        positions: vec![[1.5, -2.0, 0.25]],
        f_dc: vec![[0.1, 0.2, 0.3]],
        opacities: vec![2.5],
        scales: vec![[-4.0, -4.0, -3.0]],
    };
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("one.ply");
    let written = save_ply(&cloud, &path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(written as usize, bytes.len());
    let (_, body) = split_header(&bytes);
    assert_eq!(body.len(), RECORD_SIZE);

    let mut fields = [0.0f32; 62];
    LittleEndian::read_f32_into(body, &mut fields);
    assert_eq!(fields[0..3], [1.5, -2.0, 0.25]);
    assert_eq!(fields[3..6], [0.0, 0.0, 1.0]);
    assert_eq!(fields[6..9], [0.1, 0.2, 0.3]);
    assert!(fields[9..54].iter().all(|&v| v == 0.0));
    assert_eq!(fields[54], 2.5);
    assert_eq!(fields[55..58], [-4.0, -4.0, -3.0]);
    assert_eq!(fields[58..62], [1.0, 0.0, 0.0, 0.0]);

    assert_eq!(read_ply(&bytes).unwrap(), cloud);
}

#[test]
fn test_overwrite_replaces_previous_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.ply");
    std::fs::write(&path, b"stale").unwrap();

    let cloud = EncodedCloud {
        positions: vec![[0.0; 3]; 2],
        f_dc: vec![[0.0; 3]; 2],
        opacities: vec![0.0; 2],
        scales: vec![[0.0; 3]; 2],
    };
    save_ply(&cloud, &path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"ply\n"));
    assert_eq!(read_ply(&bytes).unwrap().len(), 2);
    // Only the output itself remains in the directory
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_truncated_file_is_rejected() {
    let cloud = EncodedCloud {
        positions: vec![[0.0; 3]; 3],
        f_dc: vec![[0.0; 3]; 3],
        opacities: vec![0.0; 3],
        scales: vec![[0.0; 3]; 3],
    };
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("t.ply");
    save_ply(&cloud, &path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let truncated = &bytes[..bytes.len() - 10];
    assert!(matches!(read_ply(truncated), Err(SplatError::InvalidFormat(_))));
}
