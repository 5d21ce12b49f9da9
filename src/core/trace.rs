//! ICP iteration traces: per-iteration rigid transforms and correspondences.
//!
//! A trace is recorded by an external solver and replayed here. Transforms
//! are absolute - each frame's rotation/translation applies to the original
//! source cloud, never to the previous frame's output.

use nalgebra::{DMatrix, DVector};

use super::cloud::PointCloud;

/// A matched pair of point indices (source cloud, target cloud).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Correspondence {
    pub source: usize,
    pub target: usize,
}

/// One ICP iteration: the rigid transform applied at that step plus the
/// correspondence set it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationFrame {
    /// D x D rotation, orthonormal in well-formed input.
    pub rotation: DMatrix<f64>,
    /// Length-D translation.
    pub translation: DVector<f64>,
    pub correspondences: Vec<Correspondence>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum TraceError {
    #[error("trace contains no frames")]
    Empty,

    #[error("frame {frame}: rotation is {rows}x{cols}, expected {dim}x{dim} for a {dim}-D source cloud")]
    RotationShape {
        frame: usize,
        rows: usize,
        cols: usize,
        dim: usize,
    },

    #[error("frame {frame}: translation has length {len}, expected {dim}")]
    TranslationShape { frame: usize, len: usize, dim: usize },

    #[error("frame {frame}, correspondence {pair}: source index {index} out of range for cloud of {len} points")]
    SourceIndexOutOfRange {
        frame: usize,
        pair: usize,
        index: usize,
        len: usize,
    },

    #[error("frame {frame}, correspondence {pair}: target index {index} out of range for cloud of {len} points")]
    TargetIndexOutOfRange {
        frame: usize,
        pair: usize,
        index: usize,
        len: usize,
    },
}

/// Ordered sequence of iteration frames. Frame 0 is the initial alignment,
/// the last frame is the converged (or terminated) alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationTrace {
    frames: Vec<IterationFrame>,
}

impl IterationTrace {
    pub fn new(frames: Vec<IterationFrame>) -> Self {
        Self { frames }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[IterationFrame] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> &IterationFrame {
        &self.frames[index]
    }

    /// Structural validation against the clouds the trace will replay over.
    ///
    /// A malformed trace is a precondition violation: the first offending
    /// frame/pair is reported and nothing is rendered.
    pub fn validate(&self, source: &PointCloud, target: &PointCloud) -> Result<(), TraceError> {
        if self.frames.is_empty() {
            return Err(TraceError::Empty);
        }

        let dim = source.dim();
        for (f, frame) in self.frames.iter().enumerate() {
            if frame.rotation.nrows() != dim || frame.rotation.ncols() != dim {
                return Err(TraceError::RotationShape {
                    frame: f,
                    rows: frame.rotation.nrows(),
                    cols: frame.rotation.ncols(),
                    dim,
                });
            }
            if frame.translation.len() != dim {
                return Err(TraceError::TranslationShape {
                    frame: f,
                    len: frame.translation.len(),
                    dim,
                });
            }
            for (pair, c) in frame.correspondences.iter().enumerate() {
                if c.source >= source.len() {
                    return Err(TraceError::SourceIndexOutOfRange {
                        frame: f,
                        pair,
                        index: c.source,
                        len: source.len(),
                    });
                }
                if c.target >= target.len() {
                    return Err(TraceError::TargetIndexOutOfRange {
                        frame: f,
                        pair,
                        index: c.target,
                        len: target.len(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_frame(dim: usize) -> IterationFrame {
        IterationFrame {
            rotation: DMatrix::identity(dim, dim),
            translation: DVector::zeros(dim),
            correspondences: vec![
                Correspondence { source: 0, target: 0 },
                Correspondence { source: 1, target: 1 },
            ],
        }
    }

    fn two_point_cloud() -> PointCloud {
        PointCloud::from_xy(vec![0.0, 1.0], vec![0.0, 1.0])
    }

    #[test]
    fn test_valid_trace() {
        let trace = IterationTrace::new(vec![identity_frame(2), identity_frame(2)]);
        assert!(trace.validate(&two_point_cloud(), &two_point_cloud()).is_ok());
        assert_eq!(trace.len(), 2);
    }

    #[test]
    fn test_empty_trace_rejected() {
        let trace = IterationTrace::new(vec![]);
        assert!(matches!(
            trace.validate(&two_point_cloud(), &two_point_cloud()),
            Err(TraceError::Empty)
        ));
    }

    #[test]
    fn test_rotation_dim_mismatch() {
        // 3x3 rotation against a 2-D cloud
        let trace = IterationTrace::new(vec![identity_frame(3)]);
        let err = trace
            .validate(&two_point_cloud(), &two_point_cloud())
            .unwrap_err();
        assert!(matches!(
            err,
            TraceError::RotationShape { frame: 0, rows: 3, cols: 3, dim: 2 }
        ));
    }

    #[test]
    fn test_translation_length_mismatch() {
        let mut frame = identity_frame(2);
        frame.translation = DVector::zeros(3);
        let trace = IterationTrace::new(vec![frame]);
        assert!(matches!(
            trace.validate(&two_point_cloud(), &two_point_cloud()),
            Err(TraceError::TranslationShape { frame: 0, len: 3, dim: 2 })
        ));
    }

    #[test]
    fn test_out_of_range_correspondence() {
        let mut frame = identity_frame(2);
        frame.correspondences.push(Correspondence { source: 0, target: 7 });
        let trace = IterationTrace::new(vec![identity_frame(2), frame]);
        let err = trace
            .validate(&two_point_cloud(), &two_point_cloud())
            .unwrap_err();
        // Error identifies the offending frame and pair
        assert!(matches!(
            err,
            TraceError::TargetIndexOutOfRange { frame: 1, pair: 2, index: 7, len: 2 }
        ));
    }
}
