//! Domain types shared by both rendering pipelines - no display dependencies.

pub mod cloud;
pub mod gaussian;
pub mod grid;
pub mod parser;
pub mod trace;

pub use cloud::PointCloud;
pub use gaussian::{DegenerateCovariance, Gaussian};
pub use grid::{Bounds, Cell, GridError, NdtGrid};
pub use parser::{parse_grid, parse_replay, ParseError, ReplayInputs};
pub use trace::{Correspondence, IterationFrame, IterationTrace, TraceError};
