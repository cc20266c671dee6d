//! I/O modules: AOI geometry loading, provider scene search, and archive
//! retrieval.

pub mod aoi;
pub mod search;
pub mod download;

pub use aoi::Aoi;
pub use search::SearchClient;
pub use download::Downloader;
