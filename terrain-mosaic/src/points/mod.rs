//! Point-table (xyz) files.
//!
//! A point table is a comma-separated text file: one header row naming the
//! columns, then one row per [`ElevationSample`]. The raster engine reads a
//! sorted variant where rows are grouped by latitude, then ordered by
//! longitude.
//!
//! | Mode | Columns |
//! |------|---------|
//! | [`FieldMode::Simple`] | `x,y,z` (longitude, latitude, elevation) |
//! | [`FieldMode::Full`] | tile, pixel and RGBA columns followed by longitude, latitude, elevation |

use crate::decode::ElevationSample;
use std::cmp::Ordering;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

const SIMPLE_HEADER: &str = "x,y,z";
const FULL_HEADER: &str = "tile_x,tile_y,tile_z,pixel_x,pixel_y,pixel_r,pixel_g,pixel_b,pixel_a,longitude,latitude,elevation";

/// Errors raised while writing or sorting a point table.
#[derive(Debug, Error)]
pub enum PointTableError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed row {line} in {path}: {reason}")]
    MalformedRow {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

impl PointTableError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Column set written for each sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FieldMode {
    /// Longitude, latitude and elevation only.
    #[default]
    Simple,
    /// Every field of the sample.
    Full,
}

impl FieldMode {
    /// Header row, without line terminator.
    pub fn header(&self) -> &'static str {
        match self {
            Self::Simple => SIMPLE_HEADER,
            Self::Full => FULL_HEADER,
        }
    }

    /// Zero-based index of the longitude column.
    pub fn longitude_column(&self) -> usize {
        match self {
            Self::Simple => 0,
            Self::Full => 9,
        }
    }

    /// Zero-based index of the latitude column.
    pub fn latitude_column(&self) -> usize {
        self.longitude_column() + 1
    }

    /// Formats one sample as a data row, without line terminator.
    pub fn format_row(&self, s: &ElevationSample) -> String {
        match self {
            Self::Simple => format!("{},{},{}", s.longitude, s.latitude, s.elevation),
            Self::Full => format!(
                "{},{},{},{},{},{},{},{},{},{},{},{}",
                s.tile.x,
                s.tile.y,
                s.tile.zoom,
                s.pixel_x,
                s.pixel_y,
                s.r,
                s.g,
                s.b,
                s.a,
                s.longitude,
                s.latitude,
                s.elevation
            ),
        }
    }
}

impl fmt::Display for FieldMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple => write!(f, "simple"),
            Self::Full => write!(f, "full"),
        }
    }
}

impl FromStr for FieldMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "full" | "verbose" => Ok(Self::Full),
            other => Err(format!("unknown field mode '{}'", other)),
        }
    }
}

/// Writes `samples` to `path` as a point table.
pub fn write_point_table(
    path: &Path,
    samples: &[ElevationSample],
    mode: FieldMode,
) -> Result<(), PointTableError> {
    let file = File::create(path).map_err(|e| PointTableError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "{}", mode.header()).map_err(|e| PointTableError::io(path, e))?;
    for sample in samples {
        writeln!(writer, "{}", mode.format_row(sample)).map_err(|e| PointTableError::io(path, e))?;
    }
    writer.flush().map_err(|e| PointTableError::io(path, e))
}

/// Writes a copy of the point table at `input` to `output` with data rows
/// sorted ascending by latitude, then longitude.
///
/// The header stays first and rows with equal keys keep their relative
/// order, so sorting an already sorted table reproduces it byte for byte.
pub fn sort_point_table(input: &Path, output: &Path, mode: FieldMode) -> Result<(), PointTableError> {
    let contents = fs::read_to_string(input).map_err(|e| PointTableError::io(input, e))?;
    let sorted = sort_rows(&contents, mode).map_err(|(line, reason)| {
        PointTableError::MalformedRow {
            path: input.to_path_buf(),
            line,
            reason,
        }
    })?;
    fs::write(output, sorted).map_err(|e| PointTableError::io(output, e))
}

/// Sorts the data rows of an in-memory point table.
///
/// Returns the 1-based line number and reason of the first unparsable row.
fn sort_rows(contents: &str, mode: FieldMode) -> Result<String, (usize, String)> {
    let mut lines = contents.lines();
    let header = lines.next().unwrap_or(mode.header());

    let mut rows = Vec::new();
    for (index, line) in lines.enumerate() {
        if line.is_empty() {
            continue;
        }
        let key = row_key(line, mode).map_err(|reason| (index + 2, reason))?;
        rows.push((key, line));
    }

    rows.sort_by(|(a, _), (b, _)| {
        match a.0.total_cmp(&b.0) {
            Ordering::Equal => a.1.total_cmp(&b.1),
            other => other,
        }
    });

    let mut out = String::with_capacity(contents.len() + 1);
    out.push_str(header);
    out.push('\n');
    for (_, line) in rows {
        out.push_str(line);
        out.push('\n');
    }
    Ok(out)
}

/// (latitude, longitude) of a data row.
fn row_key(line: &str, mode: FieldMode) -> Result<(f64, f64), String> {
    let fields: Vec<&str> = line.split(',').collect();
    let parse = |column: usize, name: &str| -> Result<f64, String> {
        let raw = fields
            .get(column)
            .ok_or_else(|| format!("missing {} column", name))?;
        raw.trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid {} '{}': {}", name, raw, e))
    };
    Ok((
        parse(mode.latitude_column(), "latitude")?,
        parse(mode.longitude_column(), "longitude")?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::TileCoord;
    use tempfile::TempDir;

    fn sample(lon: f64, lat: f64, elevation: f64) -> ElevationSample {
        ElevationSample {
            tile: TileCoord::new(2, 1, 2),
            pixel_x: 3,
            pixel_y: 4,
            r: 1,
            g: 134,
            b: 160,
            a: 255,
            longitude: lon,
            latitude: lat,
            elevation,
        }
    }

    #[test]
    fn test_headers() {
        assert_eq!(FieldMode::Simple.header(), "x,y,z");
        assert_eq!(FieldMode::Full.header().split(',').count(), 12);
        assert_eq!(
            FieldMode::Full.header().split(',').nth(FieldMode::Full.longitude_column()),
            Some("longitude")
        );
        assert_eq!(
            FieldMode::Full.header().split(',').nth(FieldMode::Full.latitude_column()),
            Some("latitude")
        );
    }

    #[test]
    fn test_format_rows() {
        let s = sample(-0.5, 10.25, 0.0);
        assert_eq!(FieldMode::Simple.format_row(&s), "-0.5,10.25,0");
        assert_eq!(
            FieldMode::Full.format_row(&s),
            "2,1,2,3,4,1,134,160,255,-0.5,10.25,0"
        );
    }

    #[test]
    fn test_field_mode_parse() {
        assert_eq!("full".parse::<FieldMode>(), Ok(FieldMode::Full));
        assert_eq!("Simple".parse::<FieldMode>(), Ok(FieldMode::Simple));
        assert!("xyz".parse::<FieldMode>().is_err());
        assert_eq!(FieldMode::default(), FieldMode::Simple);
    }

    #[test]
    fn test_write_point_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("2_2_1.xyz");

        write_point_table(&path, &[sample(1.0, 2.0, 3.5), sample(4.0, 5.0, 6.0)], FieldMode::Simple)
            .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "x,y,z\n1,2,3.5\n4,5,6\n");
    }

    #[test]
    fn test_sort_orders_by_latitude_then_longitude() {
        let input = "x,y,z\n2,1,10\n1,1,20\n5,-3,30\n0,7,40\n";
        let sorted = sort_rows(input, FieldMode::Simple).unwrap();
        assert_eq!(sorted, "x,y,z\n5,-3,30\n1,1,20\n2,1,10\n0,7,40\n");
    }

    #[test]
    fn test_sort_uses_full_mode_columns() {
        let input = format!(
            "{}\n0,0,0,0,0,0,0,0,0,3,2,1\n0,0,0,0,0,0,0,0,0,9,-2,1\n",
            FULL_HEADER
        );
        let sorted = sort_rows(&input, FieldMode::Full).unwrap();
        let rows: Vec<&str> = sorted.lines().skip(1).collect();
        assert_eq!(rows[0], "0,0,0,0,0,0,0,0,0,9,-2,1");
    }

    #[test]
    fn test_sort_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let raw = dir.path().join("raw.xyz");
        let once = dir.path().join("once.xyz");
        let twice = dir.path().join("twice.xyz");

        let samples: Vec<_> = (0..50)
            .map(|i| sample((i * 7 % 13) as f64, (i % 5) as f64 * -1.5, i as f64))
            .collect();
        write_point_table(&raw, &samples, FieldMode::Simple).unwrap();

        sort_point_table(&raw, &once, FieldMode::Simple).unwrap();
        sort_point_table(&once, &twice, FieldMode::Simple).unwrap();

        assert_eq!(fs::read(&once).unwrap(), fs::read(&twice).unwrap());
    }

    #[test]
    fn test_sort_reports_malformed_row() {
        let dir = TempDir::new().unwrap();
        let raw = dir.path().join("bad.xyz");
        fs::write(&raw, "x,y,z\n1,2,3\nnot,a,number\n").unwrap();

        let err = sort_point_table(&raw, &dir.path().join("out.xyz"), FieldMode::Simple).unwrap_err();
        assert!(matches!(err, PointTableError::MalformedRow { line: 3, .. }));
    }

    #[test]
    fn test_missing_input_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = sort_point_table(
            &dir.path().join("missing.xyz"),
            &dir.path().join("out.xyz"),
            FieldMode::Simple,
        )
        .unwrap_err();
        assert!(matches!(err, PointTableError::Io { .. }));
    }
}
