//! Registration diagnostics app
//!
//! Composes the three NDT grid layers into one plot and drives the ICP
//! replay at a fixed inter-frame interval. All heavy computation happens in
//! the core/renderer modules; this layer only draws the produced values.

use eframe::egui;
use egui_plot::{Legend, Line, Plot, PlotImage, PlotPoint, PlotPoints, Points};
use tracing::info;

use crate::core::{NdtGrid, ReplayInputs};
use crate::ndt::{
    render_cell_points, render_density_field, render_grid_lines, CellLabel, DensityField,
    GridLinePolicy, GridLines, LabelTarget, PointBatch, DEFAULT_FIELD_RESOLUTION,
};
use crate::replay::{FrameState, ReplayConfig, ReplayEngine};
use crate::theme::{colors, density_color};
use crate::time::now_seconds;

/// Active tab in the visualization
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveTab {
    #[default]
    Grid,
    Replay,
}

/// Precomputed grid layers plus the lazily-created field texture.
struct GridView {
    grid: NdtGrid,
    field: DensityField,
    lines: GridLines,
    batches: Vec<PointBatch>,
    texture: Option<egui::TextureHandle>,
}

impl GridView {
    fn new(grid: NdtGrid) -> Self {
        // Field resolution follows the reference lattice; degenerate cells
        // are skipped inside the renderer
        let field = render_density_field(&grid, DEFAULT_FIELD_RESOLUTION)
            .expect("default field resolution is >= 2");
        let lines = render_grid_lines(&grid, GridLinePolicy::FromSteps);
        let label = CellLabel {
            text: "Target or map".into(),
            target: LabelTarget::LastNonEmpty,
        };
        let batches = render_cell_points(&grid, Some(&label));
        Self {
            grid,
            field,
            lines,
            batches,
            texture: None,
        }
    }

    /// Upload the density field as a texture, bottom row of the field at the
    /// bottom of the image.
    fn texture(&mut self, ctx: &egui::Context) -> egui::TextureId {
        let texture = self.texture.get_or_insert_with(|| {
            let resolution = self.field.resolution();
            let max = self.field.max_value();
            let scale = if max > 0.0 { 1.0 / max } else { 0.0 };

            let mut pixels = Vec::with_capacity(resolution * resolution);
            for row in (0..resolution).rev() {
                for col in 0..resolution {
                    let t = (self.field.value(row, col) * scale) as f32;
                    pixels.push(density_color(t));
                }
            }
            let image = egui::ColorImage {
                size: [resolution, resolution],
                pixels,
            };
            ctx.load_texture("density_field", image, egui::TextureOptions::LINEAR)
        });
        texture.id()
    }
}

/// Replay playback state: current frame plus the wall-clock accumulator.
struct ReplaySession {
    engine: ReplayEngine,
    state: FrameState,
    /// None until playback starts; the pre-animation static view is shown.
    started: bool,
    playing: bool,
    next_frame: usize,
    last_advance: f64,
}

impl ReplaySession {
    fn new(inputs: ReplayInputs) -> Result<Self, crate::core::TraceError> {
        let engine = ReplayEngine::new(
            inputs.source,
            inputs.target,
            inputs.trace,
            ReplayConfig::default(),
        )?;
        let state = engine.initial_state();
        Ok(Self {
            engine,
            state,
            started: false,
            playing: false,
            next_frame: 0,
            last_advance: 0.0,
        })
    }

    fn finished(&self) -> bool {
        self.next_frame >= self.engine.frame_count()
    }

    fn restart(&mut self) {
        self.state = self.engine.initial_state();
        self.started = false;
        self.playing = false;
        self.next_frame = 0;
    }

    fn step(&mut self, now: f64) {
        if self.finished() {
            self.playing = false;
            return;
        }
        self.state = self.engine.frame_state(self.next_frame);
        self.started = true;
        self.next_frame += 1;
        self.last_advance = now;
    }

    /// Advance when the frame interval has elapsed.
    fn tick(&mut self, now: f64) {
        if !self.playing {
            return;
        }
        if now - self.last_advance >= self.engine.frame_interval().as_secs_f64() {
            self.step(now);
        }
    }
}

/// Registration diagnostics viewer - NDT grid view and ICP replay.
pub struct RegVisApp {
    grid: Option<GridView>,
    replay: Option<ReplaySession>,
    active_tab: ActiveTab,
}

impl RegVisApp {
    pub fn new(
        grid: Option<NdtGrid>,
        replay: Option<ReplayInputs>,
    ) -> Result<Self, crate::core::TraceError> {
        let replay = replay.map(ReplaySession::new).transpose()?;
        if let Some(g) = grid.as_ref() {
            info!(rows = g.rows(), cols = g.cols(), "Grid view loaded");
        }
        let active_tab = if grid.is_some() {
            ActiveTab::Grid
        } else {
            ActiveTab::Replay
        };
        Ok(Self {
            grid: grid.map(GridView::new),
            replay,
            active_tab,
        })
    }

    fn render_grid_tab(&mut self, ui: &mut egui::Ui) {
        let Some(view) = self.grid.as_mut() else {
            ui.label("No grid loaded - set REG_VIS_GRID to a grid JSON file");
            return;
        };

        let texture = view.texture(ui.ctx());
        let bounds = view.grid.bounds();
        let center = PlotPoint::new(
            (bounds.min[0] + bounds.max[0]) / 2.0,
            (bounds.min[1] + bounds.max[1]) / 2.0,
        );
        let size = egui::vec2(bounds.width() as f32, bounds.height() as f32);

        ui.label(format!(
            "{} x {} cells, {} occupied, {} skipped",
            view.grid.rows(),
            view.grid.cols(),
            view.grid.non_empty_cells().count(),
            view.field.skipped_cells(),
        ));

        Plot::new("ndt_grid")
            .data_aspect(1.0)
            .legend(Legend::default())
            .show(ui, |plot_ui| {
                plot_ui.image(PlotImage::new(texture, center, size));

                for seg in view.lines.vertical.iter().chain(&view.lines.horizontal) {
                    plot_ui.line(
                        Line::new(PlotPoints::from(vec![seg.from, seg.to]))
                            .color(colors::GRID_LINE)
                            .width(1.0),
                    );
                }

                for batch in &view.batches {
                    let mut points = Points::new(PlotPoints::from(batch.points.clone()))
                        .color(colors::CELL_POINTS)
                        .radius(2.0);
                    if let Some(label) = &batch.label {
                        points = points.name(label);
                    }
                    plot_ui.points(points);
                }
            });
    }

    fn render_replay_tab(&mut self, ui: &mut egui::Ui) {
        let Some(session) = self.replay.as_mut() else {
            ui.label("No replay loaded - set REG_VIS_TRACE to a replay JSON file");
            return;
        };

        let now = now_seconds();
        session.tick(now);

        ui.horizontal(|ui| {
            let play_label = if session.playing { "Pause" } else { "Play" };
            if ui.button(play_label).clicked() {
                session.playing = !session.playing;
                session.last_advance = now;
            }
            if ui.button("Step").clicked() {
                session.playing = false;
                session.step(now);
            }
            if ui.button("Restart").clicked() {
                session.restart();
            }

            let title = if session.started {
                format!("Iteration {}", session.state.iteration)
            } else {
                "Initial alignment".to_string()
            };
            ui.colored_label(colors::TEXT_MUTED, title);
        });

        let target: Vec<[f64; 2]> = session.engine.target().xy_points();
        let state = &session.state;

        Plot::new("icp_replay")
            .data_aspect(1.0)
            .legend(Legend::default())
            .show(ui, |plot_ui| {
                for edge in &state.edges {
                    plot_ui.line(
                        Line::new(PlotPoints::from(vec![edge.from, edge.to]))
                            .color(colors::CORRESPONDENCE)
                            .width(1.0),
                    );
                }
                plot_ui.points(
                    Points::new(PlotPoints::from(target))
                        .color(colors::TARGET)
                        .radius(3.0)
                        .name("Target"),
                );
                plot_ui.points(
                    Points::new(PlotPoints::from(state.moved.clone()))
                        .color(colors::SOURCE)
                        .radius(3.0)
                        .name("Source"),
                );
            });

        if session.playing {
            ui.ctx()
                .request_repaint_after(session.engine.frame_interval());
        }
    }
}

impl eframe::App for RegVisApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("tabs").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.active_tab, ActiveTab::Grid, "NDT Grid");
                ui.selectable_value(&mut self.active_tab, ActiveTab::Replay, "ICP Replay");
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| match self.active_tab {
            ActiveTab::Grid => self.render_grid_tab(ui),
            ActiveTab::Replay => self.render_replay_tab(ui),
        });
    }
}
