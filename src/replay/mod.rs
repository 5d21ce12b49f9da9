//! ICP replay: deterministic frame-by-frame animation of an iteration trace.

mod engine;

pub use engine::{
    Edge, FinalFramePolicy, FrameState, ReplayConfig, ReplayEngine, DEFAULT_FRAME_INTERVAL,
};
