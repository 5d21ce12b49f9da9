//! Diagnostic visualizations for point-cloud registration results.
//!
//! Two independent pipelines over a shared core:
//! - NDT grid rendering: a summed Gaussian density field, the grid partition
//!   lines, and per-cell point batches, composed as layers in one frame.
//! - ICP replay: a validated iteration trace replayed as complete frame
//!   states (moved source positions + correspondence edges).
//!
//! No registration happens here - grids and traces are precomputed inputs.
//! The optional `viewer` feature adds an egui/egui_plot display surface.

pub mod core;
pub mod ndt;
pub mod replay;

#[cfg(feature = "viewer")]
pub mod app;
#[cfg(feature = "viewer")]
pub mod theme;
#[cfg(feature = "viewer")]
mod time;

pub use crate::core::{
    parse_grid, parse_replay, Bounds, Cell, Correspondence, DegenerateCovariance, Gaussian,
    GridError, IterationFrame, IterationTrace, NdtGrid, ParseError, PointCloud, ReplayInputs,
    TraceError,
};
pub use crate::ndt::{
    render_cell_points, render_density_field, render_grid_lines, CellLabel, DensityField,
    GridLinePolicy, GridLines, LabelTarget, LineSegment, PointBatch, RenderError,
};
pub use crate::replay::{
    Edge, FinalFramePolicy, FrameState, ReplayConfig, ReplayEngine, DEFAULT_FRAME_INTERVAL,
};
