//! Bivariate Gaussian density evaluation for NDT cells.
//!
//! The inverse covariance and normalization constant are computed once at
//! construction, so a degenerate covariance surfaces as an explicit error
//! before any lattice work starts. Evaluation itself is pure and infallible.

use std::f64::consts::PI;

use nalgebra::{Matrix2, Vector2};

/// Covariance could not be inverted (singular, non-positive, or non-finite).
///
/// A cell carrying one of these is skipped by the field renderer; it never
/// aborts the overall render.
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("degenerate covariance: determinant {det:e} is not a positive finite value")]
pub struct DegenerateCovariance {
    pub det: f64,
}

/// A 2-D Gaussian with precomputed inverse covariance.
#[derive(Debug, Clone, PartialEq)]
pub struct Gaussian {
    mean: Vector2<f64>,
    cov_inv: Matrix2<f64>,
    /// 1 / (2π √det Σ)
    norm: f64,
}

impl Gaussian {
    pub fn new(mean: Vector2<f64>, cov: Matrix2<f64>) -> Result<Self, DegenerateCovariance> {
        let det = cov.determinant();
        if !det.is_finite() || det <= 0.0 {
            return Err(DegenerateCovariance { det });
        }
        let cov_inv = cov
            .try_inverse()
            .ok_or(DegenerateCovariance { det })?;

        Ok(Self {
            mean,
            cov_inv,
            norm: 1.0 / (2.0 * PI * det.sqrt()),
        })
    }

    pub fn mean(&self) -> Vector2<f64> {
        self.mean
    }

    /// Probability density at (x, y).
    pub fn pdf(&self, x: f64, y: f64) -> f64 {
        let d = Vector2::new(x, y) - self.mean;
        let mahalanobis_sq = d.dot(&(self.cov_inv * d));
        self.norm * (-0.5 * mahalanobis_sq).exp()
    }

    /// Density at each query point, in input order.
    pub fn evaluate(&self, points: &[[f64; 2]]) -> Vec<f64> {
        points.iter().map(|p| self.pdf(p[0], p[1])).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_peak_at_mean() {
        let g = Gaussian::new(Vector2::new(1.0, -2.0), Matrix2::identity()).unwrap();
        // Standard bivariate normal peaks at 1/(2π)
        let peak = g.pdf(1.0, -2.0);
        assert!((peak - 1.0 / (2.0 * PI)).abs() < 1e-12);
        // Strictly lower anywhere else
        assert!(g.pdf(1.5, -2.0) < peak);
        assert!(g.pdf(1.0, -1.0) < peak);
    }

    #[test]
    fn test_symmetry() {
        let g = Gaussian::new(Vector2::zeros(), Matrix2::identity()).unwrap();
        assert!((g.pdf(1.0, 0.0) - g.pdf(-1.0, 0.0)).abs() < 1e-15);
        assert!((g.pdf(0.0, 2.0) - g.pdf(0.0, -2.0)).abs() < 1e-15);
    }

    #[test]
    fn test_singular_covariance_rejected() {
        // Zero variance along one axis (all points collinear)
        let cov = Matrix2::new(1.0, 0.0, 0.0, 0.0);
        assert!(Gaussian::new(Vector2::zeros(), cov).is_err());

        // Fully zero covariance
        assert!(Gaussian::new(Vector2::zeros(), Matrix2::zeros()).is_err());
    }

    #[test]
    fn test_negative_and_nan_determinant_rejected() {
        // Indefinite matrix: det < 0
        let cov = Matrix2::new(0.0, 1.0, 1.0, 0.0);
        let err = Gaussian::new(Vector2::zeros(), cov).unwrap_err();
        assert!(err.det < 0.0);

        let cov = Matrix2::new(f64::NAN, 0.0, 0.0, 1.0);
        assert!(Gaussian::new(Vector2::zeros(), cov).is_err());
    }

    #[test]
    fn test_evaluate_matches_pdf() {
        let g = Gaussian::new(Vector2::new(0.5, 0.5), Matrix2::new(2.0, 0.3, 0.3, 1.0)).unwrap();
        let points = [[0.0, 0.0], [0.5, 0.5], [-1.0, 2.0]];
        let densities = g.evaluate(&points);
        assert_eq!(densities.len(), 3);
        for (p, d) in points.iter().zip(&densities) {
            assert_eq!(*d, g.pdf(p[0], p[1]));
        }
    }
}
