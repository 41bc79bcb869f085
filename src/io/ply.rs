//! Binary little-endian PLY for Gaussian splats.
//!
//! Layout:
//! ```text
//! ply
//! format binary_little_endian 1.0
//! comment text-splat glyph cloud
//! element vertex N
//! property float x, y, z
//! property float nx, ny, nz
//! property float f_dc_0 .. f_dc_2
//! property float f_rest_0 .. f_rest_44
//! property float opacity
//! property float scale_0 .. scale_2
//! property float rot_0 .. rot_3
//! end_header
//! N × 62 × f32 (248 bytes per vertex)
//! ```
//!
//! Readers locate attributes by name and position, so the property order is
//! fixed and must match the record layout of [`SplatRecord::to_fields`].

use crate::core::{EncodedCloud, SplatRecord, SH_REST_COUNT};
use crate::error::SplatError;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Bytes per encoded vertex.
pub const RECORD_SIZE: usize = SplatRecord::FIELD_COUNT * std::mem::size_of::<f32>();

const HEADER_COMMENT: &str = "text-splat glyph cloud";
const END_HEADER: &str = "end_header";

/// Names of the 62 float properties, in file order.
pub fn property_names() -> Vec<String> {
    let mut names: Vec<String> = ["x", "y", "z", "nx", "ny", "nz"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    names.extend((0..3).map(|i| format!("f_dc_{i}")));
    names.extend((0..SH_REST_COUNT).map(|i| format!("f_rest_{i}")));
    names.push("opacity".to_string());
    names.extend((0..3).map(|i| format!("scale_{i}")));
    names.extend((0..4).map(|i| format!("rot_{i}")));
    names
}

/// ASCII header for `num_vertices` vertices, including the final newline.
pub fn header(num_vertices: usize) -> String {
    let mut lines = vec![
        "ply".to_string(),
        "format binary_little_endian 1.0".to_string(),
        format!("comment {HEADER_COMMENT}"),
        format!("element vertex {num_vertices}"),
    ];
    lines.extend(property_names().iter().map(|n| format!("property float {n}")));
    lines.push(END_HEADER.to_string());

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Write the header and every record to `writer`.
pub fn write_ply<W: Write>(writer: &mut W, cloud: &EncodedCloud) -> Result<(), SplatError> {
    cloud.validate()?;

    writer.write_all(header(cloud.len()).as_bytes())?;
    for record in cloud.records() {
        for value in record.to_fields() {
            writer.write_f32::<LittleEndian>(value)?;
        }
    }
    Ok(())
}

/// Encode the complete file in memory.
pub fn encode_ply(cloud: &EncodedCloud) -> Result<Vec<u8>, SplatError> {
    let mut bytes = Vec::with_capacity(header(cloud.len()).len() + cloud.len() * RECORD_SIZE);
    write_ply(&mut bytes, cloud)?;
    Ok(bytes)
}

/// Save a cloud to `path`.
///
/// Data is written to a temporary file next to `path` and renamed into place
/// only after every byte is flushed. On failure the temporary file is removed
/// and `path` is left untouched.
pub fn save_ply(cloud: &EncodedCloud, path: &Path) -> Result<u64, SplatError> {
    cloud.validate()?;

    let bytes = write_atomic(path, |writer| write_ply(writer, cloud))?;
    info!(path = %path.display(), points = cloud.len(), bytes, "wrote splat PLY");
    Ok(bytes)
}

/// Run `write` against a temporary file in `path`'s directory, then rename
/// it over `path`. Returns the final file size.
///
/// A new file gets the mode a plain create would give it (0666 minus the
/// umask on unix); an existing file keeps its permissions.
pub(crate) fn write_atomic<F>(path: &Path, write: F) -> Result<u64, SplatError>
where
    F: FnOnce(&mut BufWriter<NamedTempFile>) -> Result<(), SplatError>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut builder = tempfile::Builder::new();
    builder.prefix(".text-splat-").suffix(".tmp");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    let temp = builder.tempfile_in(dir)?;

    let mut writer = BufWriter::new(temp);
    write(&mut writer)?;
    writer.flush()?;
    let temp = writer.into_inner().map_err(|e| SplatError::Io(e.into_error()))?;

    if let Ok(existing) = std::fs::metadata(path) {
        temp.as_file().set_permissions(existing.permissions())?;
    }
    temp.as_file().sync_all()?;
    let file = temp.persist(path).map_err(|e| SplatError::Io(e.error))?;
    Ok(file.metadata()?.len())
}

/// Parse a file produced by [`write_ply`].
///
/// Only the exact schema written by this module is accepted: the same format
/// line, one `vertex` element, and the 62 float properties in order.
pub fn read_ply(bytes: &[u8]) -> Result<EncodedCloud, SplatError> {
    let (num_vertices, body) = checked_body(bytes)?;

    let mut cursor = Cursor::new(body);
    let mut cloud = EncodedCloud {
        positions: Vec::with_capacity(num_vertices),
        f_dc: Vec::with_capacity(num_vertices),
        opacities: Vec::with_capacity(num_vertices),
        scales: Vec::with_capacity(num_vertices),
    };

    let mut fields = [0.0f32; SplatRecord::FIELD_COUNT];
    for _ in 0..num_vertices {
        cursor.read_f32_into::<LittleEndian>(&mut fields)?;
        let record = SplatRecord::from_fields(&fields);
        cloud.positions.push(record.position);
        cloud.f_dc.push(record.f_dc);
        cloud.opacities.push(record.opacity);
        cloud.scales.push(record.scale);
    }

    Ok(cloud)
}

/// Decode every full record of a file produced by [`write_ply`], including
/// the constant normal, rotation and higher-order SH fields.
pub fn read_records(bytes: &[u8]) -> Result<Vec<SplatRecord>, SplatError> {
    let (num_vertices, mut reader) = checked_body(bytes)?;
    let mut records = Vec::with_capacity(num_vertices);
    let mut fields = [0.0f32; SplatRecord::FIELD_COUNT];
    for _ in 0..num_vertices {
        reader.read_f32_into::<LittleEndian>(&mut fields)?;
        records.push(SplatRecord::from_fields(&fields));
    }
    Ok(records)
}

/// Validate the header and the body length. Returns the vertex count and
/// exactly the bytes of its records.
fn checked_body(bytes: &[u8]) -> Result<(usize, &[u8]), SplatError> {
    let (num_vertices, body_offset) = parse_header(bytes)?;
    let body = &bytes[body_offset..];

    let expected = num_vertices
        .checked_mul(RECORD_SIZE)
        .ok_or_else(|| SplatError::InvalidFormat("vertex count overflows".to_string()))?;
    if body.len() < expected {
        return Err(SplatError::InvalidFormat(format!(
            "body holds {} bytes, expected {} for {} vertices",
            body.len(),
            expected,
            num_vertices
        )));
    }
    debug!(num_vertices, body_bytes = body.len(), "parsed splat PLY header");

    Ok((num_vertices, &body[..expected]))
}

/// Validate the header and return `(vertex count, offset of the body)`.
fn parse_header(bytes: &[u8]) -> Result<(usize, usize), SplatError> {
    let marker = format!("{END_HEADER}\n");
    let end = find(bytes, marker.as_bytes())
        .ok_or_else(|| SplatError::InvalidFormat("missing end_header".to_string()))?;
    let body_offset = end + marker.len();

    let text = std::str::from_utf8(&bytes[..end])
        .map_err(|_| SplatError::InvalidFormat("header is not valid UTF-8".to_string()))?;
    let mut lines = text.lines().filter(|l| !l.starts_with("comment"));

    expect_line(lines.next(), "ply")?;
    expect_line(lines.next(), "format binary_little_endian 1.0")?;

    let element = lines
        .next()
        .ok_or_else(|| SplatError::InvalidFormat("missing element line".to_string()))?;
    let num_vertices = element
        .strip_prefix("element vertex ")
        .and_then(|n| n.trim().parse::<usize>().ok())
        .ok_or_else(|| SplatError::InvalidFormat(format!("bad element line: {element:?}")))?;

    let declared: Vec<&str> = lines.collect();
    let expected: Vec<String> = property_names()
        .iter()
        .map(|n| format!("property float {n}"))
        .collect();
    if declared.len() != expected.len() {
        return Err(SplatError::InvalidFormat(format!(
            "expected {} properties, found {}",
            expected.len(),
            declared.len()
        )));
    }
    if let Some((got, want)) = declared.iter().zip(&expected).find(|(g, w)| **g != w.as_str()) {
        return Err(SplatError::InvalidFormat(format!(
            "property mismatch: got {got:?}, expected {want:?}"
        )));
    }

    Ok((num_vertices, body_offset))
}

fn expect_line(line: Option<&str>, want: &str) -> Result<(), SplatError> {
    match line {
        Some(l) if l == want => Ok(()),
        other => Err(SplatError::InvalidFormat(format!(
            "expected {want:?}, got {other:?}"
        ))),
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_cloud() -> EncodedCloud {
        EncodedCloud {
            positions: vec![[0.5, -0.25, 0.001], [1.0, 2.0, -3.0]],
            f_dc: vec![[1.77, 1.77, 1.77], [0.0, -1.0, 0.5]],
            opacities: vec![2.944, -1.0],
            scales: vec![[-4.1, -4.1, -3.2], [0.0, 0.0, 0.0]],
        }
    }

    #[test]
    fn test_property_names_order() {
        let names = property_names();
        assert_eq!(names.len(), 62);
        assert_eq!(&names[..9], &["x", "y", "z", "nx", "ny", "nz", "f_dc_0", "f_dc_1", "f_dc_2"]);
        assert_eq!(names[9], "f_rest_0");
        assert_eq!(names[53], "f_rest_44");
        assert_eq!(names[54], "opacity");
        assert_eq!(&names[55..58], &["scale_0", "scale_1", "scale_2"]);
        assert_eq!(&names[58..], &["rot_0", "rot_1", "rot_2", "rot_3"]);
    }

    #[test]
    fn test_record_size() {
        assert_eq!(RECORD_SIZE, 248);
    }

    #[test]
    fn test_header_layout() {
        let h = header(7);
        let lines: Vec<&str> = h.lines().collect();
        assert_eq!(lines[0], "ply");
        assert_eq!(lines[1], "format binary_little_endian 1.0");
        assert!(lines[2].starts_with("comment "));
        assert_eq!(lines[3], "element vertex 7");
        assert_eq!(lines[4], "property float x");
        assert_eq!(*lines.last().unwrap(), "end_header");
        assert_eq!(lines.iter().filter(|l| l.starts_with("property float ")).count(), 62);
        assert!(h.ends_with("end_header\n"));
    }

    #[test]
    fn test_body_size_is_248_per_vertex() {
        let cloud = sample_cloud();
        let bytes = encode_ply(&cloud).unwrap();
        assert_eq!(bytes.len(), header(2).len() + 2 * 248);
    }

    #[test]
    fn test_first_record_bytes() {
        let cloud = sample_cloud();
        let bytes = encode_ply(&cloud).unwrap();
        let body = &bytes[header(2).len()..];

        assert_eq!(&body[0..4], &0.5f32.to_le_bytes());
        assert_eq!(&body[4..8], &(-0.25f32).to_le_bytes());
        // nz
        assert_eq!(&body[20..24], &1.0f32.to_le_bytes());
        // opacity sits after 9 + 45 floats
        assert_eq!(&body[54 * 4..55 * 4], &2.944f32.to_le_bytes());
        // rot_0
        assert_eq!(&body[58 * 4..59 * 4], &1.0f32.to_le_bytes());
    }

    #[test]
    fn test_read_recovers_written_cloud() {
        let cloud = sample_cloud();
        let parsed = read_ply(&encode_ply(&cloud).unwrap()).unwrap();
        assert_eq!(parsed, cloud);
    }

    #[test]
    fn test_write_rejects_mismatched_lengths() {
        let mut cloud = sample_cloud();
        cloud.f_dc.pop();
        assert!(matches!(
            encode_ply(&cloud),
            Err(SplatError::InvalidGeometry { field: "f_dc", .. })
        ));
    }

    #[test]
    fn test_read_rejects_truncated_body() {
        let mut bytes = encode_ply(&sample_cloud()).unwrap();
        bytes.truncate(bytes.len() - 10);
        assert!(matches!(read_ply(&bytes), Err(SplatError::InvalidFormat(_))));
    }

    #[test]
    fn test_read_rejects_reordered_properties() {
        let bytes = encode_ply(&sample_cloud()).unwrap();
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let swapped = text.replacen("property float scale_0", "property float rot_9", 1);
        assert!(matches!(
            read_ply(swapped.as_bytes()),
            Err(SplatError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_read_rejects_ascii_format() {
        let bytes = header(0).replace("binary_little_endian", "ascii");
        assert!(matches!(read_ply(bytes.as_bytes()), Err(SplatError::InvalidFormat(_))));
    }

    #[test]
    fn test_save_creates_file_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.ply");
        let written = save_ply(&sample_cloud(), &path).unwrap();

        assert_eq!(written as usize, header(2).len() + 2 * RECORD_SIZE);
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_save_into_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no/such/dir/out.ply");
        assert!(matches!(save_ply(&sample_cloud(), &path), Err(SplatError::Io(_))));
        assert!(!path.exists());
    }

    /// Passes bytes through until `remaining` runs out, then fails.
    struct FailAfter<W> {
        inner: W,
        remaining: usize,
    }

    impl<W: Write> Write for FailAfter<W> {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.remaining == 0 {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
            }
            let n = buf.len().min(self.remaining);
            self.remaining -= n;
            self.inner.write(&buf[..n])
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.inner.flush()
        }
    }

    fn large_cloud(n: usize) -> EncodedCloud {
        EncodedCloud {
            positions: vec![[0.1, 0.2, 0.3]; n],
            f_dc: vec![[0.0; 3]; n],
            opacities: vec![1.0; n],
            scales: vec![[-4.0; 3]; n],
        }
    }

    #[test]
    fn test_failed_write_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.ply");
        let cloud = large_cloud(200);

        let result = write_atomic(&path, |writer| {
            let mut failing = FailAfter {
                inner: writer,
                remaining: 20_000,
            };
            write_ply(&mut failing, &cloud)
        });

        assert!(matches!(result, Err(SplatError::Io(_))));
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_failed_write_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.ply");
        std::fs::write(&path, b"previous").unwrap();

        let result = write_atomic(&path, |writer| {
            writer.write_all(b"ply\n")?;
            Err(SplatError::InvalidFormat("aborted".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(std::fs::read(&path).unwrap(), b"previous");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_new_file_mode_matches_plain_create() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("plain");
        std::fs::File::create(&plain).unwrap();
        let path = dir.path().join("out.ply");
        save_ply(&sample_cloud(), &path).unwrap();

        let mode = |p: &Path| std::fs::metadata(p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&path), mode(&plain));
    }

    #[cfg(unix)]
    #[test]
    fn test_overwrite_keeps_existing_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.ply");
        std::fs::write(&path, b"old").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o640)).unwrap();

        save_ply(&sample_cloud(), &path).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }

    #[test]
    fn test_huge_vertex_count_is_rejected() {
        let bytes = header(usize::MAX);
        assert!(matches!(read_records(bytes.as_bytes()), Err(SplatError::InvalidFormat(_))));
        assert!(matches!(read_ply(bytes.as_bytes()), Err(SplatError::InvalidFormat(_))));

        let bytes = header(1_000_000);
        assert!(matches!(read_records(bytes.as_bytes()), Err(SplatError::InvalidFormat(_))));
    }
}
