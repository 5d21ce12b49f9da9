//! Point-cloud storage shared by both visualization pipelines.
//!
//! Clouds are immutable inputs: the renderers only read them and derive
//! transient per-session state. Storage is SoA with an optional z channel;
//! the plots are 2-D, so z is carried through transforms but never drawn.

use nalgebra::DVector;

/// An ordered sequence of 2-D or 3-D points.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Option<Vec<f64>>,
}

impl PointCloud {
    pub fn from_xy(x: Vec<f64>, y: Vec<f64>) -> Self {
        assert_eq!(x.len(), y.len(), "x and y must have same length");
        Self { x, y, z: None }
    }

    pub fn from_xyz(x: Vec<f64>, y: Vec<f64>, z: Vec<f64>) -> Self {
        assert_eq!(x.len(), y.len(), "x and y must have same length");
        assert_eq!(x.len(), z.len(), "x and z must have same length");
        Self { x, y, z: Some(z) }
    }

    pub fn len(&self) -> usize {
        debug_assert_eq!(self.x.len(), self.y.len());
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Spatial dimension: 2 without a z channel, 3 with one.
    pub fn dim(&self) -> usize {
        if self.z.is_some() {
            3
        } else {
            2
        }
    }

    /// The drawable (x, y) position of point `i`.
    pub fn xy(&self, i: usize) -> [f64; 2] {
        [self.x[i], self.y[i]]
    }

    /// Point `i` as a column vector of length `dim()`, for transform math.
    pub fn point(&self, i: usize) -> DVector<f64> {
        match &self.z {
            Some(z) => DVector::from_vec(vec![self.x[i], self.y[i], z[i]]),
            None => DVector::from_vec(vec![self.x[i], self.y[i]]),
        }
    }

    /// All drawable positions, in point order.
    pub fn xy_points(&self) -> Vec<[f64; 2]> {
        (0..self.len()).map(|i| self.xy(i)).collect()
    }
}
