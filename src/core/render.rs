//! Raster rendering: band extraction, normalization, colormapping, and
//! VRT materialization.

use crate::types::{InsarError, InsarResult};
use gdal::raster::RasterCreationOption;
use gdal::{Dataset, DriverManager};
use ndarray::Array2;
use std::fs;
use std::path::{Path, PathBuf};

/// Read band 1 of `raster` as a (rows, cols) array.
pub fn read_band(raster: &Path) -> InsarResult<Array2<f32>> {
    let dataset = Dataset::open(raster)?;
    let (width, height) = dataset.raster_size();
    let rasterband = dataset.rasterband(1)?;
    let band_data = rasterband.read_as::<f32>((0, 0), (width, height), (width, height), None)?;
    Array2::from_shape_vec((height, width), band_data.data).map_err(|e| {
        InsarError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("cannot reshape band data from {}: {}", raster.display(), e),
        ))
    })
}

/// Render `raster`'s first band to `<raster>.png`; returns the PNG path.
pub fn render_raster(raster: &Path) -> InsarResult<PathBuf> {
    let band = read_band(raster)?;
    let (rows, cols) = band.dim();
    log::debug!("{}: {} x {} samples", raster.display(), cols, rows);

    let pixels = rasterize(&band);
    let png = png_path_for(raster);
    image::save_buffer(
        &png,
        &pixels,
        cols as u32,
        rows as u32,
        image::ExtendedColorType::Rgb8,
    )
    .map_err(|e| InsarError::Io(std::io::Error::other(e)))?;
    log::info!("Rendered {} -> {}", raster.display(), png.display());
    Ok(png)
}

/// Min-max normalize a band over its finite samples and map it through
/// the diverging ramp. Non-finite samples render black; a constant band
/// renders the low end.
pub fn rasterize(band: &Array2<f32>) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(band.len() * 3);
    match finite_range(band) {
        Some((min, max)) if max > min => {
            let span = max - min;
            for &v in band.iter() {
                if v.is_finite() {
                    pixels.extend_from_slice(&diverging_rgb((v - min) / span));
                } else {
                    pixels.extend_from_slice(&[0, 0, 0]);
                }
            }
        }
        Some(_) => {
            log::warn!("Constant-valued band, rendering the low end of the ramp");
            for &v in band.iter() {
                if v.is_finite() {
                    pixels.extend_from_slice(&diverging_rgb(0.0));
                } else {
                    pixels.extend_from_slice(&[0, 0, 0]);
                }
            }
        }
        None => {
            log::warn!("Band has no finite samples, rendering black");
            pixels.resize(band.len() * 3, 0);
        }
    }
    pixels
}

/// Smallest and largest finite sample, if any.
fn finite_range(band: &Array2<f32>) -> Option<(f32, f32)> {
    let mut range: Option<(f32, f32)> = None;
    for &v in band.iter() {
        if v.is_finite() {
            range = Some(match range {
                Some((min, max)) => (min.min(v), max.max(v)),
                None => (v, v),
            });
        }
    }
    range
}

/// Map a normalized sample through a red-white-blue diverging ramp, the
/// palette interferogram plots conventionally use.
pub fn diverging_rgb(t: f32) -> [u8; 3] {
    const LOW: [f32; 3] = [178.0, 24.0, 43.0]; // warm end
    const MID: [f32; 3] = [247.0, 247.0, 247.0]; // near-white
    const HIGH: [f32; 3] = [33.0, 102.0, 172.0]; // cool end

    let t = t.clamp(0.0, 1.0);
    let (from, to, f) = if t < 0.5 {
        (LOW, MID, t * 2.0)
    } else {
        (MID, HIGH, (t - 0.5) * 2.0)
    };
    let channel = |i: usize| (from[i] + (to[i] - from[i]) * f).round() as u8;
    [channel(0), channel(1), channel(2)]
}

fn png_path_for(raster: &Path) -> PathBuf {
    let mut name = raster.as_os_str().to_os_string();
    name.push(".png");
    PathBuf::from(name)
}

/// Convert every `.vrt` in `dir` to a compressed GeoTIFF next to it, so
/// virtual rasters the processing graph leaves behind become shareable
/// real files. Returns the written paths.
pub fn materialize_vrts(dir: &Path) -> InsarResult<Vec<PathBuf>> {
    let mut written = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("vrt") {
            continue;
        }
        let source = Dataset::open(&path)?;
        let tif = path.with_extension("tif");
        let driver = DriverManager::get_driver_by_name("GTiff")?;
        let options = [RasterCreationOption {
            key: "COMPRESS",
            value: "LZW",
        }];
        driver.create_copy(&source, &tif, &options)?;
        log::info!("Materialized {} -> {}", path.display(), tif.display());
        written.push(tif);
    }
    Ok(written)
}

/// Raster products eligible for rendering, sorted for a stable report.
pub fn find_rasters(dir: &Path) -> InsarResult<Vec<PathBuf>> {
    let mut rasters = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        match path.extension().and_then(|e| e.to_str()) {
            Some("tif") | Some("tiff") => rasters.push(path),
            _ => {}
        }
    }
    rasters.sort();
    Ok(rasters)
}
