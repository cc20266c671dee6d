use clap::Parser;
use sarpair::config::{self, Credentials};
use sarpair::{logging, select_pair, Aoi, Downloader, InsarError, SearchClient, SearchWindow};
use std::path::PathBuf;

/// Search, pair, and download Sentinel-1 SLC scenes for an area of
/// interest and date window.
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// GeoJSON file describing the area of interest
    aoi: PathBuf,

    /// Window start date (YYYYMMDD)
    start: String,

    /// Window end date (YYYYMMDD)
    end: String,

    /// Directory receiving downloaded scenes
    #[arg(default_value = config::DEFAULT_DATA_DIR)]
    out_dir: PathBuf,
}

fn main() {
    let args = Args::parse();
    logging::init_for("fetch");
    if let Err(e) = run(&args) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let credentials = Credentials::from_env()?;

    let aoi = Aoi::from_geojson_file(&args.aoi)?;
    let wkt = aoi.to_wkt()?;
    log::info!("AOI: {}", wkt);

    let window = SearchWindow::from_compact_dates(&args.start, &args.end, wkt)?;

    let client = SearchClient::new(credentials.clone())?;
    let scenes = client.search(&window)?;
    log::info!("Search returned {} candidate scene(s)", scenes.len());
    if scenes.len() < 2 {
        return Err(InsarError::InsufficientScenes(format!(
            "only {} scene(s) in the search window",
            scenes.len()
        ))
        .into());
    }

    let pair = select_pair(&scenes, window.start_target(), window.end_target())?;
    log::info!("Reference: {}", pair.reference);
    log::info!("Secondary: {}", pair.secondary);
    log::info!("Temporal baseline: {} day(s)", pair.temporal_baseline_days());

    let downloader = Downloader::new(credentials)?;
    downloader.fetch_pair(&pair, &args.out_dir)?;
    log::info!("Scene pair ready under {}", args.out_dir.display());
    Ok(())
}
