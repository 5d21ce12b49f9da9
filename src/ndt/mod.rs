//! NDT grid rendering: density field raster plus partition overlays.

mod renderer;

pub use renderer::{
    render_cell_points, render_density_field, render_grid_lines, CellLabel, DensityField,
    GridLinePolicy, GridLines, LabelTarget, LineSegment, PointBatch, RenderError,
    DEFAULT_FIELD_RESOLUTION,
};
