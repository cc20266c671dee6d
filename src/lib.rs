//! sarpair: Sentinel-1 InSAR scene pairing and processing pipeline
//!
//! A thin orchestration layer over three external systems: the ASF scene
//! search/download service, ESA SNAP's `gpt` graph processor (invoked as a
//! subprocess, never reimplemented here), and GDAL for raster access. The
//! one piece of real selection logic lives in [`core::pair`]: narrow the
//! candidate scenes to the busiest relative orbit, then pick the two
//! acquisitions nearest to a pair of target dates.

pub mod types;
pub mod config;
pub mod logging;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    InsarError, InsarResult, SceneRecord, ScenePair, SearchWindow,
};

pub use io::{Aoi, Downloader, SearchClient};
pub use core::gpt::{GraphRunner, SnapGpt};
pub use core::pair::select_pair;
