//! JSON loading boundary for precomputed registration results.
//!
//! The fitting and solving steps live elsewhere; they hand over their output
//! as JSON documents. Raw wire records are deserialized here and converted
//! into validated domain types - wrong shapes fail fast with a descriptive
//! error instead of surfacing later as a partially-wrong visualization.

use nalgebra::{DMatrix, DVector, Matrix2, Vector2};
use serde::Deserialize;
use tracing::debug;

use super::cloud::PointCloud;
use super::grid::{Bounds, Cell, GridError, NdtGrid};
use super::trace::{Correspondence, IterationFrame, IterationTrace, TraceError};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Trace(#[from] TraceError),

    #[error("cloud channels are ragged: x has {x} values, y has {y}, z has {z}")]
    RaggedCloud { x: usize, y: usize, z: usize },

    #[error("cell ({row}, {col}) has points but no mean/cov")]
    MissingGaussian { row: usize, col: usize },

    #[error("frame {frame}: rotation rows are ragged")]
    RaggedRotation { frame: usize },
}

#[derive(Deserialize)]
struct BoundsRecord {
    min: [f64; 2],
    max: [f64; 2],
}

#[derive(Deserialize)]
struct CellRecord {
    #[serde(default)]
    points: Vec<[f64; 2]>,
    #[serde(default)]
    mean: Option<[f64; 2]>,
    #[serde(default)]
    cov: Option<[[f64; 2]; 2]>,
}

#[derive(Deserialize)]
struct GridRecord {
    bounds: BoundsRecord,
    x_step: f64,
    y_step: f64,
    cells: Vec<Vec<CellRecord>>,
}

#[derive(Deserialize)]
struct CloudRecord {
    x: Vec<f64>,
    y: Vec<f64>,
    #[serde(default)]
    z: Option<Vec<f64>>,
}

#[derive(Deserialize)]
struct FrameRecord {
    rotation: Vec<Vec<f64>>,
    translation: Vec<f64>,
    #[serde(default)]
    correspondences: Vec<(usize, usize)>,
}

#[derive(Deserialize)]
struct ReplayRecord {
    source: CloudRecord,
    target: CloudRecord,
    frames: Vec<FrameRecord>,
}

/// Everything the replay engine needs, parsed and validated together.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayInputs {
    pub source: PointCloud,
    pub target: PointCloud,
    pub trace: IterationTrace,
}

/// Parse a fitted NDT grid from JSON.
pub fn parse_grid(json: &str) -> Result<NdtGrid, ParseError> {
    let record: GridRecord = serde_json::from_str(json)?;

    let mut cells = Vec::with_capacity(record.cells.len());
    for (row, row_rec) in record.cells.into_iter().enumerate() {
        let mut cells_row = Vec::with_capacity(row_rec.len());
        for (col, c) in row_rec.into_iter().enumerate() {
            if c.points.is_empty() {
                cells_row.push(Cell::empty());
                continue;
            }
            let (mean, cov) = match (c.mean, c.cov) {
                (Some(m), Some(v)) => (m, v),
                _ => return Err(ParseError::MissingGaussian { row, col }),
            };
            cells_row.push(Cell::new(
                c.points,
                Vector2::new(mean[0], mean[1]),
                Matrix2::new(cov[0][0], cov[0][1], cov[1][0], cov[1][1]),
            ));
        }
        cells.push(cells_row);
    }

    let grid = NdtGrid::new(
        Bounds {
            min: record.bounds.min,
            max: record.bounds.max,
        },
        record.x_step,
        record.y_step,
        cells,
    )?;

    debug!(rows = grid.rows(), cols = grid.cols(), "Parsed NDT grid");
    Ok(grid)
}

/// Parse an ICP replay (clouds + iteration trace) from JSON.
///
/// The trace is validated against the clouds before being returned, so a
/// successful parse is ready to replay.
pub fn parse_replay(json: &str) -> Result<ReplayInputs, ParseError> {
    let record: ReplayRecord = serde_json::from_str(json)?;

    let source = cloud_from_record(record.source)?;
    let target = cloud_from_record(record.target)?;

    let mut frames = Vec::with_capacity(record.frames.len());
    for (f, frame) in record.frames.into_iter().enumerate() {
        let rows = frame.rotation.len();
        let cols = frame.rotation.first().map_or(0, |r| r.len());
        if frame.rotation.iter().any(|r| r.len() != cols) {
            return Err(ParseError::RaggedRotation { frame: f });
        }
        let rotation = DMatrix::from_fn(rows, cols, |r, c| frame.rotation[r][c]);

        frames.push(IterationFrame {
            rotation,
            translation: DVector::from_vec(frame.translation),
            correspondences: frame
                .correspondences
                .into_iter()
                .map(|(s, t)| Correspondence { source: s, target: t })
                .collect(),
        });
    }

    let trace = IterationTrace::new(frames);
    trace.validate(&source, &target)?;

    debug!(
        points = source.len(),
        frames = trace.len(),
        "Parsed ICP replay inputs"
    );
    Ok(ReplayInputs {
        source,
        target,
        trace,
    })
}

fn cloud_from_record(record: CloudRecord) -> Result<PointCloud, ParseError> {
    let (x, y) = (record.x, record.y);
    let z_len = record.z.as_ref().map_or(x.len(), |z| z.len());
    if x.len() != y.len() || x.len() != z_len {
        return Err(ParseError::RaggedCloud {
            x: x.len(),
            y: y.len(),
            z: z_len,
        });
    }
    Ok(match record.z {
        Some(z) => PointCloud::from_xyz(x, y, z),
        None => PointCloud::from_xy(x, y),
    })
}
