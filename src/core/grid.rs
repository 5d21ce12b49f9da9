//! Fitted NDT grid: rectangular cell array with per-cell Gaussian parameters.
//!
//! The grid is produced by an external fitting step; here it is a read-only
//! input. Construction is where structural preconditions are enforced - a
//! malformed grid is rejected with the offending dimension in the message,
//! while numerical degeneracy inside a cell is deferred to render time.

use nalgebra::{Matrix2, Vector2};

use super::gaussian::{DegenerateCovariance, Gaussian};

/// World-coordinate bounding box (min corner, max corner).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f64 {
        self.max[1] - self.min[1]
    }

    fn is_valid(&self) -> bool {
        self.min.iter().chain(self.max.iter()).all(|v| v.is_finite())
            && self.width() > 0.0
            && self.height() > 0.0
    }
}

/// One grid partition unit: the points that fell inside it plus their
/// Gaussian summary. A cell with no points is empty and contributes nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub points: Vec<[f64; 2]>,
    pub mean: Vector2<f64>,
    pub cov: Matrix2<f64>,
}

impl Cell {
    pub fn empty() -> Self {
        Self {
            points: Vec::new(),
            mean: Vector2::zeros(),
            cov: Matrix2::zeros(),
        }
    }

    pub fn new(points: Vec<[f64; 2]>, mean: Vector2<f64>, cov: Matrix2<f64>) -> Self {
        Self { points, mean, cov }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The cell's density model. Fails for singular covariance; the renderer
    /// treats that as "skip this cell", not as a render error.
    pub fn gaussian(&self) -> Result<Gaussian, DegenerateCovariance> {
        Gaussian::new(self.mean, self.cov)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum GridError {
    #[error("grid bounds are degenerate or not finite: min {min:?}, max {max:?}")]
    InvalidBounds { min: [f64; 2], max: [f64; 2] },

    #[error("grid steps must be positive and finite: x_step {x_step}, y_step {y_step}")]
    InvalidStep { x_step: f64, y_step: f64 },

    #[error("cell array has {rows} rows but bounds/steps derive {expected}")]
    RowCountMismatch { rows: usize, expected: usize },

    #[error("row {row} has {cols} cells, bounds/steps derive {expected}")]
    ColCountMismatch { row: usize, cols: usize, expected: usize },
}

/// A fitted grid of Gaussian cells, addressed by (row, column).
///
/// Rows run along y, columns along x. Invariant: the cell array dimensions
/// equal the ceiling division of the bounding-box span by the step sizes.
#[derive(Debug, Clone, PartialEq)]
pub struct NdtGrid {
    bounds: Bounds,
    x_step: f64,
    y_step: f64,
    cells: Vec<Vec<Cell>>,
}

impl NdtGrid {
    pub fn new(
        bounds: Bounds,
        x_step: f64,
        y_step: f64,
        cells: Vec<Vec<Cell>>,
    ) -> Result<Self, GridError> {
        if !bounds.is_valid() {
            return Err(GridError::InvalidBounds {
                min: bounds.min,
                max: bounds.max,
            });
        }
        if !(x_step.is_finite() && x_step > 0.0 && y_step.is_finite() && y_step > 0.0) {
            return Err(GridError::InvalidStep { x_step, y_step });
        }

        let expected_rows = (bounds.height() / y_step).ceil() as usize;
        let expected_cols = (bounds.width() / x_step).ceil() as usize;

        if cells.len() != expected_rows {
            return Err(GridError::RowCountMismatch {
                rows: cells.len(),
                expected: expected_rows,
            });
        }
        for (row, r) in cells.iter().enumerate() {
            if r.len() != expected_cols {
                return Err(GridError::ColCountMismatch {
                    row,
                    cols: r.len(),
                    expected: expected_cols,
                });
            }
        }

        Ok(Self {
            bounds,
            x_step,
            y_step,
            cells,
        })
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn x_step(&self) -> f64 {
        self.x_step
    }

    pub fn y_step(&self) -> f64 {
        self.y_step
    }

    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    pub fn cols(&self) -> usize {
        self.cells.first().map_or(0, |r| r.len())
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        &self.cells[row][col]
    }

    /// All cells with their (row, col), row-major.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &Cell)> {
        self.cells
            .iter()
            .enumerate()
            .flat_map(|(row, r)| r.iter().enumerate().map(move |(col, c)| (row, col, c)))
    }

    /// Cells with at least one point, row-major.
    pub fn non_empty_cells(&self) -> impl Iterator<Item = (usize, usize, &Cell)> {
        self.cells().filter(|(_, _, c)| !c.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_rows(rows: usize, cols: usize) -> Vec<Vec<Cell>> {
        (0..rows).map(|_| (0..cols).map(|_| Cell::empty()).collect()).collect()
    }

    #[test]
    fn test_shape_invariant_holds() {
        // span 10 x 6, steps 2.5 and 2.0 -> ceil: 4 cols, 3 rows
        let bounds = Bounds {
            min: [0.0, 0.0],
            max: [10.0, 6.0],
        };
        let grid = NdtGrid::new(bounds, 2.5, 2.0, empty_rows(3, 4)).unwrap();
        assert_eq!(grid.rows(), 3);
        assert_eq!(grid.cols(), 4);
        assert_eq!(grid.non_empty_cells().count(), 0);
    }

    #[test]
    fn test_ceiling_division() {
        // span 10 x 6, steps 3.0 and 4.0 -> ceil(10/3)=4 cols, ceil(6/4)=2 rows
        let bounds = Bounds {
            min: [0.0, 0.0],
            max: [10.0, 6.0],
        };
        assert!(NdtGrid::new(bounds, 3.0, 4.0, empty_rows(2, 4)).is_ok());
        assert!(matches!(
            NdtGrid::new(bounds, 3.0, 4.0, empty_rows(2, 3)),
            Err(GridError::ColCountMismatch { row: 0, cols: 3, expected: 4 })
        ));
    }

    #[test]
    fn test_row_count_mismatch() {
        let bounds = Bounds {
            min: [0.0, 0.0],
            max: [4.0, 4.0],
        };
        let err = NdtGrid::new(bounds, 2.0, 2.0, empty_rows(3, 2)).unwrap_err();
        assert!(matches!(err, GridError::RowCountMismatch { rows: 3, expected: 2 }));
    }

    #[test]
    fn test_invalid_bounds_and_steps() {
        let inverted = Bounds {
            min: [1.0, 0.0],
            max: [0.0, 1.0],
        };
        assert!(matches!(
            NdtGrid::new(inverted, 1.0, 1.0, vec![]),
            Err(GridError::InvalidBounds { .. })
        ));

        let bounds = Bounds {
            min: [0.0, 0.0],
            max: [1.0, 1.0],
        };
        assert!(matches!(
            NdtGrid::new(bounds, 0.0, 1.0, vec![]),
            Err(GridError::InvalidStep { .. })
        ));
        assert!(matches!(
            NdtGrid::new(bounds, 1.0, f64::NAN, vec![]),
            Err(GridError::InvalidStep { .. })
        ));
    }

    #[test]
    fn test_row_major_iteration_order() {
        let bounds = Bounds {
            min: [0.0, 0.0],
            max: [2.0, 2.0],
        };
        let mut cells = empty_rows(2, 2);
        cells[1][0].points.push([0.5, 1.5]);
        let grid = NdtGrid::new(bounds, 1.0, 1.0, cells).unwrap();

        let order: Vec<(usize, usize)> = grid.cells().map(|(r, c, _)| (r, c)).collect();
        assert_eq!(order, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);

        let non_empty: Vec<(usize, usize)> =
            grid.non_empty_cells().map(|(r, c, _)| (r, c)).collect();
        assert_eq!(non_empty, vec![(1, 0)]);
    }
}
