//! Native viewer for precomputed registration results
//!
//! Run with: cargo run --bin reg-viewer --features viewer
//!
//! Inputs come from the environment: REG_VIS_GRID points at a fitted-grid
//! JSON file, REG_VIS_TRACE at an ICP replay JSON file. Either may be unset;
//! the corresponding tab then shows a hint instead.

use reg_vis::app::RegVisApp;
use reg_vis::core::{parse_grid, parse_replay, NdtGrid, ReplayInputs};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,reg_vis=debug"));
    fmt().with_env_filter(filter).with_target(true).init();

    let grid: Option<NdtGrid> = match std::env::var("REG_VIS_GRID") {
        Ok(path) => {
            info!(path = %path, "Loading NDT grid");
            Some(parse_grid(&std::fs::read_to_string(&path)?)?)
        }
        Err(_) => None,
    };

    let replay: Option<ReplayInputs> = match std::env::var("REG_VIS_TRACE") {
        Ok(path) => {
            info!(path = %path, "Loading ICP replay");
            Some(parse_replay(&std::fs::read_to_string(&path)?)?)
        }
        Err(_) => None,
    };

    let app = RegVisApp::new(grid, replay)?;

    eframe::run_native(
        "Registration Diagnostics",
        eframe::NativeOptions::default(),
        Box::new(|_cc| Ok(Box::new(app))),
    )?;
    Ok(())
}
