//! Replays a fixed ICP iteration trace as a sequence of frame states.
//!
//! Each frame is recomputed wholesale from the original source cloud and the
//! frame's absolute transform - there are no mutable plot handles carried
//! between frames, so the edge set always has exactly the current frame's
//! cardinality and stale edges cannot survive a shrinking correspondence set.

use std::time::Duration;

use tracing::debug;

use crate::core::cloud::PointCloud;
use crate::core::trace::{IterationTrace, TraceError};

/// Inter-frame interval of the reference playback.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(500);

/// Whether playback covers the whole trace or stops one frame short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FinalFramePolicy {
    /// Play every recorded frame, including the converged one.
    #[default]
    IncludeAll,
    /// Stop after frame `len - 2`, matching the reference playback which
    /// dropped the last trace entry.
    DropLast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayConfig {
    pub final_frame: FinalFramePolicy,
    pub frame_interval: Duration,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            final_frame: FinalFramePolicy::default(),
            frame_interval: DEFAULT_FRAME_INTERVAL,
        }
    }
}

/// A correspondence edge: moved source position to target position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub from: [f64; 2],
    pub to: [f64; 2],
}

/// One renderable frame: the moved source positions and the correspondence
/// edges of that iteration. A complete value, not a view into engine state.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameState {
    pub iteration: usize,
    pub moved: Vec<[f64; 2]>,
    pub edges: Vec<Edge>,
}

/// Deterministic replay over validated inputs.
///
/// Construction validates the whole trace against the clouds; a malformed
/// trace never reaches rendering. After that, every frame state is a pure
/// function of `(inputs, frame index)`.
pub struct ReplayEngine {
    source: PointCloud,
    target: PointCloud,
    trace: IterationTrace,
    config: ReplayConfig,
}

impl ReplayEngine {
    pub fn new(
        source: PointCloud,
        target: PointCloud,
        trace: IterationTrace,
        config: ReplayConfig,
    ) -> Result<Self, TraceError> {
        trace.validate(&source, &target)?;
        debug!(
            source_points = source.len(),
            target_points = target.len(),
            frames = trace.len(),
            "Replay engine ready"
        );
        Ok(Self {
            source,
            target,
            trace,
            config,
        })
    }

    pub fn source(&self) -> &PointCloud {
        &self.source
    }

    pub fn target(&self) -> &PointCloud {
        &self.target
    }

    pub fn config(&self) -> ReplayConfig {
        self.config
    }

    pub fn frame_interval(&self) -> Duration {
        self.config.frame_interval
    }

    /// Number of frames playback will render under the configured policy.
    pub fn frame_count(&self) -> usize {
        match self.config.final_frame {
            FinalFramePolicy::IncludeAll => self.trace.len(),
            FinalFramePolicy::DropLast => self.trace.len().saturating_sub(1),
        }
    }

    /// The static pre-animation view: unmoved source, no edges.
    pub fn initial_state(&self) -> FrameState {
        FrameState {
            iteration: 0,
            moved: self.source.xy_points(),
            edges: Vec::new(),
        }
    }

    /// Frame state for iteration `index`.
    ///
    /// The transform is applied to the original source cloud (absolute, not
    /// incremental). Panics if `index` is outside the trace - indices come
    /// from `frame_count`, which is always in range.
    pub fn frame_state(&self, index: usize) -> FrameState {
        let frame = self.trace.frame(index);

        let moved: Vec<[f64; 2]> = (0..self.source.len())
            .map(|i| {
                let p = &frame.rotation * self.source.point(i) + &frame.translation;
                [p[0], p[1]]
            })
            .collect();

        let edges = frame
            .correspondences
            .iter()
            .map(|c| Edge {
                from: moved[c.source],
                to: self.target.xy(c.target),
            })
            .collect();

        FrameState {
            iteration: index,
            moved,
            edges,
        }
    }

    /// All playback frames in order. Played at `frame_interval`, this
    /// sequence is the animation; there is no looping.
    pub fn frames(&self) -> impl Iterator<Item = FrameState> + '_ {
        (0..self.frame_count()).map(|i| self.frame_state(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::trace::{Correspondence, IterationFrame};
    use nalgebra::{DMatrix, DVector};

    fn frame(rotation: DMatrix<f64>, translation: DVector<f64>) -> IterationFrame {
        IterationFrame {
            rotation,
            translation,
            correspondences: vec![
                Correspondence { source: 0, target: 0 },
                Correspondence { source: 1, target: 1 },
            ],
        }
    }

    fn identity_frame() -> IterationFrame {
        frame(DMatrix::identity(2, 2), DVector::zeros(2))
    }

    fn engine_with(frames: Vec<IterationFrame>, config: ReplayConfig) -> ReplayEngine {
        let source = PointCloud::from_xy(vec![0.0, 1.0], vec![0.0, 2.0]);
        let target = PointCloud::from_xy(vec![3.0, 4.0], vec![3.0, 5.0]);
        ReplayEngine::new(source, target, IterationTrace::new(frames), config).unwrap()
    }

    #[test]
    fn test_identity_frame_leaves_source_in_place() {
        let engine = engine_with(
            vec![identity_frame(), identity_frame()],
            ReplayConfig::default(),
        );

        let state = engine.frame_state(0);
        assert_eq!(state.moved, vec![[0.0, 0.0], [1.0, 2.0]]);
        assert_eq!(state.edges.len(), 2);
        assert_eq!(state.edges[0], Edge { from: [0.0, 0.0], to: [3.0, 3.0] });
        assert_eq!(state.edges[1], Edge { from: [1.0, 2.0], to: [4.0, 5.0] });
    }

    #[test]
    fn test_transforms_are_absolute_not_accumulated() {
        let shift = |dx: f64| frame(DMatrix::identity(2, 2), DVector::from_vec(vec![dx, 0.0]));
        let engine = engine_with(vec![shift(1.0), shift(1.0)], ReplayConfig::default());

        // Both frames carry the same absolute transform, so frame 1 must not
        // compound frame 0's shift
        assert_eq!(engine.frame_state(0).moved[0], [1.0, 0.0]);
        assert_eq!(engine.frame_state(1).moved[0], [1.0, 0.0]);
    }

    #[test]
    fn test_rotation_applied() {
        // 90 degrees counterclockwise
        let rot = DMatrix::from_row_slice(2, 2, &[0.0, -1.0, 1.0, 0.0]);
        let engine = engine_with(
            vec![frame(rot, DVector::zeros(2))],
            ReplayConfig::default(),
        );

        let state = engine.frame_state(0);
        let p = state.moved[1]; // (1, 2) -> (-2, 1)
        assert!((p[0] + 2.0).abs() < 1e-12);
        assert!((p[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_initial_state_has_no_edges() {
        let engine = engine_with(vec![identity_frame()], ReplayConfig::default());
        let state = engine.initial_state();
        assert_eq!(state.moved, vec![[0.0, 0.0], [1.0, 2.0]]);
        assert!(state.edges.is_empty());
    }

    #[test]
    fn test_edge_set_shrinks_with_correspondences() {
        let mut second = identity_frame();
        second.correspondences.truncate(1);
        let engine = engine_with(vec![identity_frame(), second], ReplayConfig::default());

        // No stale edges: the second frame has exactly one edge
        assert_eq!(engine.frame_state(0).edges.len(), 2);
        assert_eq!(engine.frame_state(1).edges.len(), 1);
    }

    #[test]
    fn test_final_frame_policies() {
        let frames = vec![identity_frame(), identity_frame(), identity_frame()];
        let all = engine_with(frames.clone(), ReplayConfig::default());
        assert_eq!(all.frame_count(), 3);
        assert_eq!(all.frames().count(), 3);

        let reference = engine_with(
            frames,
            ReplayConfig {
                final_frame: FinalFramePolicy::DropLast,
                ..ReplayConfig::default()
            },
        );
        assert_eq!(reference.frame_count(), 2);
        assert_eq!(reference.frames().last().unwrap().iteration, 1);
    }

    #[test]
    fn test_out_of_range_correspondence_rejected_up_front() {
        let mut bad = identity_frame();
        bad.correspondences.push(Correspondence { source: 5, target: 0 });

        let source = PointCloud::from_xy(vec![0.0, 1.0], vec![0.0, 2.0]);
        let target = PointCloud::from_xy(vec![3.0, 4.0], vec![3.0, 5.0]);
        let result = ReplayEngine::new(
            source,
            target,
            IterationTrace::new(vec![bad]),
            ReplayConfig::default(),
        );
        assert!(matches!(
            result,
            Err(TraceError::SourceIndexOutOfRange { frame: 0, pair: 2, index: 5, len: 2 })
        ));
    }

    #[test]
    fn test_three_dimensional_cloud_draws_xy() {
        let source = PointCloud::from_xyz(vec![1.0], vec![2.0], vec![3.0]);
        let target = PointCloud::from_xyz(vec![0.0], vec![0.0], vec![0.0]);
        let frame = IterationFrame {
            rotation: DMatrix::identity(3, 3),
            translation: DVector::from_vec(vec![0.5, 0.5, 9.0]),
            correspondences: vec![Correspondence { source: 0, target: 0 }],
        };
        let engine = ReplayEngine::new(
            source,
            target,
            IterationTrace::new(vec![frame]),
            ReplayConfig::default(),
        )
        .unwrap();

        // z is transformed but only (x, y) is drawn
        let state = engine.frame_state(0);
        assert_eq!(state.moved, vec![[1.5, 2.5]]);
        assert_eq!(state.edges[0].to, [0.0, 0.0]);
    }
}
