//! Parser for colored OFF meshes (one solid color per triangular face).
//!
//! Layout, line by line:
//!
//! ```text
//! OFF                      header, `OFF` or `COFF`
//! V F [E]                  vertex and face counts, edge count ignored
//! x y z ...                V vertex lines, extra columns ignored
//! 3 i0 i1 i2 r g b         F face lines, color bytes in [0, 255]
//! ```
//!
//! Indexed faces are expanded into a [`TriangleSoup`]; the vertex table only
//! serves as a lookup during expansion. Faces whose leading count is not 3 are
//! skipped.

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::mesh::TriangleSoup;

/// Progress is reported every this many face records (and on the last one).
pub const PROGRESS_STRIDE: usize = 15_000;

const HEADER_MARKERS: [&str; 2] = ["COFF", "OFF"];

// Counts come from untrusted text; don't reserve more than this up front.
const MAX_PREALLOC: usize = 1 << 20;

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("failed to open mesh file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: io::Error,
    },
    #[error("mesh source is empty, expected an OFF header")]
    MissingHeader,
    #[error("unsupported header '{0}', expected OFF or COFF")]
    UnsupportedHeader(String),
    #[error("missing vertex/face counts after the header")]
    MissingCounts,
    #[error("unexpected end of mesh: expected {expected} lines, got {found}")]
    Truncated { expected: usize, found: usize },
    #[error("malformed line {line}: {reason}")]
    Malformed { line: usize, reason: String },
    #[error("vertex index {index} on line {line} is out of range (vertex count {vertex_count})")]
    IndexOutOfRange {
        line: usize,
        index: i64,
        vertex_count: usize,
    },
    #[error("color component {value} on line {line} is outside [0, 255]")]
    ColorOutOfRange { line: usize, value: f32 },
}

/// Receives `(fraction_complete, message)` while faces are parsed.
///
/// Called synchronously from the parse loop, so implementations must be cheap
/// and must not block.
pub trait ProgressSink {
    fn report(&mut self, fraction: f32, message: &str);
}

impl<F: FnMut(f32, &str)> ProgressSink for F {
    fn report(&mut self, fraction: f32, message: &str) {
        self(fraction, message)
    }
}

/// Discards all progress updates.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _fraction: f32, _message: &str) {}
}

/// Load an OFF mesh from a file path.
pub fn load_off_from_path(
    path: impl AsRef<Path>,
    progress: impl ProgressSink,
) -> Result<TriangleSoup, MeshError> {
    let path = path.as_ref();
    log::info!("Loading OFF mesh: {}", path.display());
    let file = File::open(path).map_err(|source| MeshError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    load_off_from_reader(BufReader::new(file), progress)
}

/// Convenience helper to parse an OFF string literal.
pub fn load_off_from_str(
    contents: &str,
    progress: impl ProgressSink,
) -> Result<TriangleSoup, MeshError> {
    load_off_from_reader(io::Cursor::new(contents), progress)
}

/// Load an OFF mesh from a [`BufRead`] implementation.
pub fn load_off_from_reader<R: BufRead>(
    reader: R,
    mut progress: impl ProgressSink,
) -> Result<TriangleSoup, MeshError> {
    let mut lines = NumberedLines::new(reader);

    let (_, header) = lines.next_line()?.ok_or(MeshError::MissingHeader)?;
    let header = header.trim();
    if !HEADER_MARKERS.iter().any(|marker| header.contains(marker)) {
        return Err(MeshError::UnsupportedHeader(header.to_owned()));
    }

    let (counts_line, counts) = lines.next_line()?.ok_or(MeshError::MissingCounts)?;
    let mut tokens = counts.split_whitespace();
    let vertex_count = parse_count(tokens.next(), counts_line, "vertex count")?;
    let face_count = parse_count(tokens.next(), counts_line, "face count")?;
    let expected_lines = 2usize
        .saturating_add(vertex_count)
        .saturating_add(face_count);

    let mut table: Vec<[f32; 3]> = Vec::with_capacity(vertex_count.min(MAX_PREALLOC));
    for _ in 0..vertex_count {
        let (line_no, line) = lines.require(expected_lines)?;
        let mut tokens = line.split_whitespace();
        let x = parse_f32(tokens.next(), line_no, "x coordinate")?;
        let y = parse_f32(tokens.next(), line_no, "y coordinate")?;
        let z = parse_f32(tokens.next(), line_no, "z coordinate")?;
        table.push([x, y, z]);
    }

    let mut soup = TriangleSoup::with_capacity(face_count.min(MAX_PREALLOC));
    let mut skipped = 0usize;
    for face in 0..face_count {
        if face % PROGRESS_STRIDE == 0 || face + 1 == face_count {
            let done = face + 1;
            progress.report(
                done as f32 / face_count as f32,
                &format!("Parsing faces: {done}/{face_count}"),
            );
        }

        let (line_no, line) = lines.require(expected_lines)?;
        let mut tokens = line.split_whitespace();
        let arity = parse_int(tokens.next(), line_no, "face vertex count")?;
        if arity != 3 {
            log::debug!("Skipping {arity}-sided face on line {line_no}");
            skipped += 1;
            continue;
        }

        let mut corners = [[0.0f32; 3]; 3];
        for corner in &mut corners {
            let index = parse_int(tokens.next(), line_no, "vertex index")?;
            *corner = usize::try_from(index)
                .ok()
                .and_then(|i| table.get(i))
                .copied()
                .ok_or(MeshError::IndexOutOfRange {
                    line: line_no,
                    index,
                    vertex_count,
                })?;
        }

        let mut color = [0.0f32; 3];
        for channel in &mut color {
            let value = parse_f32(tokens.next(), line_no, "color component")?;
            if !(0.0..=255.0).contains(&value) {
                return Err(MeshError::ColorOutOfRange {
                    line: line_no,
                    value,
                });
            }
            *channel = value / 255.0;
        }

        soup.push_triangle(corners, color);
    }

    log::info!(
        "Mesh loaded: {} vertices ({} triangles, {} non-triangular faces skipped)",
        soup.vertex_count(),
        soup.triangle_count(),
        skipped
    );
    Ok(soup)
}

/// Line iterator that remembers 1-based line numbers.
struct NumberedLines<R> {
    inner: io::Lines<R>,
    line_no: usize,
}

impl<R: BufRead> NumberedLines<R> {
    fn new(reader: R) -> Self {
        Self {
            inner: reader.lines(),
            line_no: 0,
        }
    }

    fn next_line(&mut self) -> Result<Option<(usize, String)>, MeshError> {
        match self.inner.next() {
            None => Ok(None),
            Some(line) => {
                self.line_no += 1;
                let line = line.map_err(|source| MeshError::Read {
                    line: self.line_no,
                    source,
                })?;
                Ok(Some((self.line_no, line)))
            }
        }
    }

    fn require(&mut self, expected: usize) -> Result<(usize, String), MeshError> {
        self.next_line()?.ok_or(MeshError::Truncated {
            expected,
            found: self.line_no,
        })
    }
}

fn missing(line: usize, what: &str) -> MeshError {
    MeshError::Malformed {
        line,
        reason: format!("missing {what}"),
    }
}

fn parse_count(token: Option<&str>, line: usize, what: &str) -> Result<usize, MeshError> {
    let token = token.ok_or_else(|| missing(line, what))?;
    token.parse::<usize>().map_err(|e| MeshError::Malformed {
        line,
        reason: format!("invalid {what} '{token}': {e}"),
    })
}

fn parse_int(token: Option<&str>, line: usize, what: &str) -> Result<i64, MeshError> {
    let token = token.ok_or_else(|| missing(line, what))?;
    token.parse::<i64>().map_err(|e| MeshError::Malformed {
        line,
        reason: format!("invalid {what} '{token}': {e}"),
    })
}

fn parse_f32(token: Option<&str>, line: usize, what: &str) -> Result<f32, MeshError> {
    let token = token.ok_or_else(|| missing(line, what))?;
    token.parse::<f32>().map_err(|e| MeshError::Malformed {
        line,
        reason: format!("invalid {what} '{token}': {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const QUAD_VERTICES: &str = "0 0 0\n1 0 0\n1 1 0\n0 1 0\n";

    fn off(faces: &[&str]) -> String {
        format!(
            "OFF\n4 {}\n{}{}\n",
            faces.len(),
            QUAD_VERTICES,
            faces.join("\n")
        )
    }

    #[test]
    fn two_red_triangles() {
        let src = off(&["3 0 1 2 255 0 0", "3 0 1 2 255 0 0"]);
        let soup = load_off_from_str(&src, NoProgress).expect("parse");
        assert_eq!(soup.positions.len(), 6);
        assert_eq!(soup.colors.len(), 6);
        assert!(soup.colors.iter().all(|c| *c == [1.0, 0.0, 0.0]));
        assert_eq!(
            &soup.positions[..3],
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]]
        );
    }

    #[test]
    fn quad_faces_are_skipped() {
        let src = off(&["3 0 1 2 10 20 30", "4 0 1 2 3 0 255 0", "3 2 3 0 0 0 255"]);
        let soup = load_off_from_str(&src, NoProgress).expect("parse");
        assert_eq!(soup.vertex_count(), 6);
        assert_eq!(soup.triangle_count(), 2);
        assert!(soup.colors[3..].iter().all(|c| *c == [0.0, 0.0, 1.0]));
    }

    #[test]
    fn skipped_face_is_not_inspected_further() {
        let src = off(&["2 0 garbage", "3 0 1 2 0 0 0"]);
        let soup = load_off_from_str(&src, NoProgress).expect("parse");
        assert_eq!(soup.triangle_count(), 1);
    }

    #[test]
    fn face_colors_are_normalized_per_face() {
        let src = off(&["3 0 1 2 51 102 255", "3 1 2 3 0 255 0"]);
        let soup = load_off_from_str(&src, NoProgress).expect("parse");
        let first = [51.0 / 255.0, 102.0 / 255.0, 1.0];
        assert!(soup.colors[..3].iter().all(|c| *c == first));
        assert!(soup.colors[3..].iter().all(|c| *c == [0.0, 1.0, 0.0]));
    }

    #[test]
    fn coff_header_and_extra_columns_are_accepted() {
        let src = "COFF\n3 1 0\n0 0 0 255 255 255 255\n1 0 0 1 2 3 4\n0 1 0 5 6 7 8\n3 0 1 2 0 0 0 255\n";
        let soup = load_off_from_str(src, NoProgress).expect("parse");
        assert_eq!(soup.triangle_count(), 1);
        assert_eq!(soup.positions[2], [0.0, 1.0, 0.0]);
    }

    #[test]
    fn unknown_header_is_rejected() {
        let src = "PLY\n0 0\n";
        let err = load_off_from_str(src, NoProgress).unwrap_err();
        assert!(matches!(err, MeshError::UnsupportedHeader(h) if h == "PLY"));
    }

    #[test]
    fn empty_source_has_no_header() {
        let err = load_off_from_str("", NoProgress).unwrap_err();
        assert!(matches!(err, MeshError::MissingHeader));
    }

    #[test]
    fn missing_counts_line() {
        let err = load_off_from_str("OFF\n", NoProgress).unwrap_err();
        assert!(matches!(err, MeshError::MissingCounts));
    }

    #[test]
    fn malformed_counts() {
        let err = load_off_from_str("OFF\n4\n", NoProgress).unwrap_err();
        assert!(matches!(err, MeshError::Malformed { line: 2, .. }));
        let err = load_off_from_str("OFF\nfour 2\n", NoProgress).unwrap_err();
        assert!(matches!(err, MeshError::Malformed { line: 2, .. }));
    }

    #[test]
    fn out_of_range_index_fails() {
        let src = off(&["3 0 1 2 0 0 0", "3 0 1 4 0 0 0"]);
        let err = load_off_from_str(&src, NoProgress).unwrap_err();
        assert!(matches!(
            err,
            MeshError::IndexOutOfRange {
                line: 8,
                index: 4,
                vertex_count: 4
            }
        ));
    }

    #[test]
    fn negative_index_fails() {
        let src = off(&["3 0 -1 2 0 0 0"]);
        let err = load_off_from_str(&src, NoProgress).unwrap_err();
        assert!(matches!(err, MeshError::IndexOutOfRange { index: -1, .. }));
    }

    #[test]
    fn missing_color_is_malformed() {
        let src = off(&["3 0 1 2"]);
        let err = load_off_from_str(&src, NoProgress).unwrap_err();
        assert!(matches!(err, MeshError::Malformed { line: 7, .. }));
    }

    #[test]
    fn unparsable_vertex_is_malformed() {
        let src = "OFF\n3 1\n0 0 0\n1 x 0\n0 1 0\n3 0 1 2 0 0 0\n";
        let err = load_off_from_str(src, NoProgress).unwrap_err();
        assert!(matches!(err, MeshError::Malformed { line: 4, .. }));
    }

    #[test]
    fn color_out_of_range_fails() {
        let src = off(&["3 0 1 2 256 0 0"]);
        let err = load_off_from_str(&src, NoProgress).unwrap_err();
        assert!(matches!(err, MeshError::ColorOutOfRange { line: 7, .. }));
    }

    #[test]
    fn truncated_face_section() {
        let src = "OFF\n4 3\n0 0 0\n1 0 0\n1 1 0\n0 1 0\n3 0 1 2 0 0 0\n";
        let err = load_off_from_str(src, NoProgress).unwrap_err();
        assert!(matches!(
            err,
            MeshError::Truncated {
                expected: 9,
                found: 7
            }
        ));
    }

    #[test]
    fn zero_faces_yield_empty_soup_without_progress() {
        let mut calls = 0;
        let soup = load_off_from_str("OFF\n1 0\n0 0 0\n", |_: f32, _: &str| calls += 1)
            .expect("parse");
        assert!(soup.is_empty());
        assert_eq!(calls, 0);
    }

    #[test]
    fn progress_is_reported_at_stride_and_on_last_face() {
        let faces = PROGRESS_STRIDE * 2 + 5;
        let mut src = format!("OFF\n3 {faces}\n0 0 0\n1 0 0\n0 1 0\n");
        for _ in 0..faces {
            src.push_str("3 0 1 2 255 255 255\n");
        }

        let mut reports: Vec<(f32, String)> = Vec::new();
        let soup = load_off_from_str(&src, |fraction: f32, message: &str| {
            reports.push((fraction, message.to_owned()))
        })
        .expect("parse");

        assert_eq!(soup.triangle_count(), faces);
        assert_eq!(reports.len(), 4);
        assert_eq!(reports[0].1, format!("Parsing faces: 1/{faces}"));
        assert_eq!(
            reports[1].1,
            format!("Parsing faces: {}/{faces}", PROGRESS_STRIDE + 1)
        );
        assert_eq!(reports[3], (1.0, format!("Parsing faces: {faces}/{faces}")));
        assert!(reports.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn skipped_faces_still_advance_progress() {
        let src = off(&["4 0 1 2 3 0 0 0"]);
        let mut last = 0.0;
        let soup =
            load_off_from_str(&src, |fraction: f32, _: &str| last = fraction).expect("parse");
        assert!(soup.is_empty());
        assert_eq!(last, 1.0);
    }

    #[test]
    fn load_from_path() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(file, "{}", off(&["3 0 1 2 255 0 0"])).expect("write");
        let soup = load_off_from_path(file.path(), NoProgress).expect("parse");
        assert_eq!(soup.vertex_count(), 3);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_off_from_path("/definitely/not/here.off", NoProgress).unwrap_err();
        assert!(matches!(err, MeshError::Open { .. }));
        assert!(err.to_string().contains("here.off"));
    }
}
