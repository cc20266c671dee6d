use anyhow::bail;
use clap::Parser;
use sarpair::core::{render, report};
use sarpair::{config, logging};
use std::path::PathBuf;

/// Render processing products to PNGs and write the pipeline report.
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory holding the processing products
    #[arg(default_value = config::DEFAULT_OUT_DIR)]
    out_dir: PathBuf,
}

fn main() {
    let args = Args::parse();
    logging::init_for("report");
    if let Err(e) = run(&args) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let materialized = render::materialize_vrts(&args.out_dir)?;
    if !materialized.is_empty() {
        log::info!("Materialized {} virtual raster(s)", materialized.len());
    }

    let rasters = render::find_rasters(&args.out_dir)?;
    if rasters.is_empty() {
        bail!("no raster products found in {}", args.out_dir.display());
    }

    let manifest = report::generate_report(&args.out_dir, &rasters)?;
    log::info!(
        "Report for {} raster(s): {}",
        rasters.len(),
        manifest.display()
    );
    Ok(())
}
