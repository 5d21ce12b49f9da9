//! Renders a fitted NDT grid as three independent layers: a rasterized
//! probability-density field, the grid partition lines, and the raw points
//! per cell. The caller composes them in one coordinate frame.
//!
//! The field is accumulated by summing every non-empty cell's Gaussian over
//! the full evaluation lattice. A cell whose covariance cannot be inverted is
//! skipped and counted - one bad cell never aborts the render.

use tracing::{debug, warn};

use crate::core::grid::{Bounds, NdtGrid};

/// Default evaluation lattice resolution (points per axis).
pub const DEFAULT_FIELD_RESOLUTION: usize = 1000;

#[derive(Debug, Clone, thiserror::Error)]
pub enum RenderError {
    #[error("lattice resolution must be at least 2, got {0}")]
    ResolutionTooSmall(usize),
}

/// Accumulated density values over a uniform lattice spanning the grid
/// bounds, both corners inclusive. Row-major; row 0 is the min-y edge.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityField {
    values: Vec<f64>,
    resolution: usize,
    bounds: Bounds,
    skipped_cells: usize,
}

impl DensityField {
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Density at lattice position (row, col), row along y.
    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.resolution + col]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn max_value(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }

    /// Lattice position (row, col) of the maximum density.
    pub fn argmax(&self) -> (usize, usize) {
        let mut best = 0;
        for (i, &v) in self.values.iter().enumerate() {
            if v > self.values[best] {
                best = i;
            }
        }
        (best / self.resolution, best % self.resolution)
    }

    /// Cells whose density evaluation failed and contributed nothing.
    pub fn skipped_cells(&self) -> usize {
        self.skipped_cells
    }
}

/// Evaluate the summed per-cell Gaussian density over a `resolution` x
/// `resolution` lattice. Pure and deterministic given the grid.
pub fn render_density_field(grid: &NdtGrid, resolution: usize) -> Result<DensityField, RenderError> {
    if resolution < 2 {
        return Err(RenderError::ResolutionTooSmall(resolution));
    }

    let bounds = grid.bounds();
    let xs = linspace(bounds.min[0], bounds.max[0], resolution);
    let ys = linspace(bounds.min[1], bounds.max[1], resolution);

    let mut values = vec![0.0; resolution * resolution];
    let mut skipped = 0usize;

    for (row, col, cell) in grid.non_empty_cells() {
        match cell.gaussian() {
            Ok(gaussian) => {
                for (iy, &y) in ys.iter().enumerate() {
                    let base = iy * resolution;
                    for (ix, &x) in xs.iter().enumerate() {
                        values[base + ix] += gaussian.pdf(x, y);
                    }
                }
            }
            Err(e) => {
                warn!(row, col, error = %e, "Skipping cell with degenerate covariance");
                skipped += 1;
            }
        }
    }

    debug!(resolution, skipped_cells = skipped, "Density field accumulated");
    Ok(DensityField {
        values,
        resolution,
        bounds,
        skipped_cells: skipped,
    })
}

/// A straight overlay segment in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub from: [f64; 2],
    pub to: [f64; 2],
}

/// How grid-line positions are derived.
///
/// The two can disagree when the grid was built with a different rounding
/// convention than ceiling division, so the choice is the caller's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridLinePolicy {
    /// `ceil(span/step)` positions linearly spaced from min to max per axis.
    #[default]
    FromSteps,
    /// True partition edges of the stored cell array: `cols + 1` vertical and
    /// `rows + 1` horizontal positions at whole-step offsets from the min
    /// corner. The last edge may extend past the bounds on a ragged grid.
    FromCells,
}

/// Partition overlay: one full-height segment per vertical position, one
/// full-width segment per horizontal position.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLines {
    pub vertical: Vec<LineSegment>,
    pub horizontal: Vec<LineSegment>,
}

pub fn render_grid_lines(grid: &NdtGrid, policy: GridLinePolicy) -> GridLines {
    let bounds = grid.bounds();

    let (xs, ys) = match policy {
        GridLinePolicy::FromSteps => {
            let n_x = (bounds.width() / grid.x_step()).ceil() as usize;
            let n_y = (bounds.height() / grid.y_step()).ceil() as usize;
            (
                linspace(bounds.min[0], bounds.max[0], n_x),
                linspace(bounds.min[1], bounds.max[1], n_y),
            )
        }
        GridLinePolicy::FromCells => (
            (0..=grid.cols())
                .map(|i| bounds.min[0] + i as f64 * grid.x_step())
                .collect(),
            (0..=grid.rows())
                .map(|i| bounds.min[1] + i as f64 * grid.y_step())
                .collect(),
        ),
    };

    GridLines {
        vertical: xs
            .iter()
            .map(|&x| LineSegment {
                from: [x, bounds.min[1]],
                to: [x, bounds.max[1]],
            })
            .collect(),
        horizontal: ys
            .iter()
            .map(|&y| LineSegment {
                from: [bounds.min[0], y],
                to: [bounds.max[0], y],
            })
            .collect(),
    }
}

/// Which point batch carries the legend label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelTarget {
    /// The last non-empty cell in row-major order - a deterministic
    /// tie-break, not a semantically meaningful cell.
    LastNonEmpty,
    At { row: usize, col: usize },
}

/// Legend label request for [`render_cell_points`].
#[derive(Debug, Clone, PartialEq)]
pub struct CellLabel {
    pub text: String,
    pub target: LabelTarget,
}

/// One rendering batch: the raw points of one non-empty cell.
#[derive(Debug, Clone, PartialEq)]
pub struct PointBatch {
    pub row: usize,
    pub col: usize,
    pub points: Vec<[f64; 2]>,
    pub label: Option<String>,
}

/// Emit one batch per non-empty cell, row-major. At most one batch carries
/// the legend label, chosen explicitly by the caller.
pub fn render_cell_points(grid: &NdtGrid, label: Option<&CellLabel>) -> Vec<PointBatch> {
    let mut batches: Vec<PointBatch> = grid
        .non_empty_cells()
        .map(|(row, col, cell)| PointBatch {
            row,
            col,
            points: cell.points.clone(),
            label: None,
        })
        .collect();

    if let Some(label) = label {
        let index = match label.target {
            LabelTarget::LastNonEmpty => batches.len().checked_sub(1),
            LabelTarget::At { row, col } => {
                batches.iter().position(|b| b.row == row && b.col == col)
            }
        };
        match index {
            Some(i) => batches[i].label = Some(label.text.clone()),
            None => warn!(?label.target, "Label target matches no non-empty cell"),
        }
    }

    batches
}

/// `count` evenly spaced values from `start` to `end`, both inclusive.
/// A single-point span collapses to `start`.
fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    if count == 0 {
        return Vec::new();
    }
    if count == 1 {
        return vec![start];
    }
    let step = (end - start) / (count - 1) as f64;
    let mut values: Vec<f64> = (0..count).map(|i| start + i as f64 * step).collect();
    // Pin the endpoint: accumulated rounding must not push it past `end`
    values[count - 1] = end;
    values
}
