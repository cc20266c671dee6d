//! Core pipeline modules: pair selection, external graph processing, and
//! raster post-processing.

pub mod pair;
pub mod gpt;
pub mod render;
pub mod report;

// Re-export main types
pub use pair::select_pair;
pub use gpt::{GraphRunner, GraphSummary, SnapGpt};
pub use render::{find_rasters, materialize_vrts, render_raster};
pub use report::generate_report;
