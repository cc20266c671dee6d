//! Pipeline report assembly: render each raster product and write the
//! plain-text manifest.

use crate::core::render;
use crate::types::InsarResult;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the text manifest.
pub const REPORT_FILE: &str = "insar_report.txt";

/// Render every raster in `rasters` to a PNG, then write the manifest
/// into `out_dir`. Any raster failure aborts the step; the manifest is
/// only written after all renders succeed. Returns the manifest path.
pub fn generate_report(out_dir: &Path, rasters: &[PathBuf]) -> InsarResult<PathBuf> {
    for raster in rasters {
        render::render_raster(raster)?;
    }

    let report = out_dir.join(REPORT_FILE);
    fs::write(&report, manifest_body(rasters))?;
    log::info!("Wrote {}", report.display());
    Ok(report)
}

fn manifest_body(rasters: &[PathBuf]) -> String {
    let mut body = String::from("InSAR pipeline report\nOutputs:\n");
    for raster in rasters {
        body.push_str("- ");
        body.push_str(&raster.display().to_string());
        body.push('\n');
    }
    body
}
