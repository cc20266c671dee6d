//! Scene archive retrieval and unpacking.
//!
//! Each selected scene is streamed into the data directory, extracted in
//! place, and the archive deleted. The first failure aborts the run; there
//! is no resumable download and no partial-extraction recovery.

use crate::config::Credentials;
use crate::types::{InsarError, InsarResult, ScenePair, SceneRecord};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Authenticated client for archive downloads.
pub struct Downloader {
    client: reqwest::blocking::Client,
    credentials: Credentials,
}

impl Downloader {
    pub fn new(credentials: Credentials) -> InsarResult<Self> {
        // No overall timeout: SLC archives run to several GB.
        let client = reqwest::blocking::Client::builder()
            .timeout(None)
            .connect_timeout(Duration::from_secs(30))
            .user_agent(concat!("sarpair/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| InsarError::Download(format!("cannot build HTTP client: {}", e)))?;
        Ok(Downloader {
            client,
            credentials,
        })
    }

    /// Fetch both scenes of a pair into `dest`, reference first.
    pub fn fetch_pair(&self, pair: &ScenePair, dest: &Path) -> InsarResult<()> {
        for scene in [&pair.reference, &pair.secondary] {
            self.fetch_scene(scene, dest)?;
        }
        Ok(())
    }

    /// Download one scene archive into `dest`, unpack it there, and
    /// remove the archive.
    pub fn fetch_scene(&self, scene: &SceneRecord, dest: &Path) -> InsarResult<()> {
        fs::create_dir_all(dest)?;
        let archive_path = dest.join(&scene.file_name);

        self.download_archive(scene, &archive_path)?;
        let entries = extract_archive(&archive_path, dest)?;
        fs::remove_file(&archive_path)?;
        log::info!(
            "Extracted {} entries from {} into {}",
            entries,
            scene.file_name,
            dest.display()
        );
        Ok(())
    }

    fn download_archive(&self, scene: &SceneRecord, target: &Path) -> InsarResult<()> {
        match scene.size_mb {
            Some(mb) => log::info!("Downloading {} ({:.0} MB)", scene.file_name, mb),
            None => log::info!("Downloading {}", scene.file_name),
        }

        let mut response = self
            .client
            .get(&scene.download_url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .send()
            .map_err(|e| InsarError::Download(format!("{}: {}", scene.file_name, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(InsarError::Download(format!(
                "{}: provider returned {}",
                scene.file_name, status
            )));
        }

        let mut file = File::create(target).map_err(|e| {
            InsarError::Download(format!("cannot create {}: {}", target.display(), e))
        })?;
        let bytes = response
            .copy_to(&mut file)
            .map_err(|e| InsarError::Download(format!("{}: {}", scene.file_name, e)))?;
        log::info!(
            "Wrote {:.1} MB to {}",
            bytes as f64 / 1_000_000.0,
            target.display()
        );
        Ok(())
    }
}

/// Unpack every entry of `archive` into `dest`; returns the entry count.
///
/// The magic-byte check catches the common failure where an auth redirect
/// leaves an HTML error page on disk under the archive name.
pub fn extract_archive(archive: &Path, dest: &Path) -> InsarResult<usize> {
    if !is_zip_file(archive)? {
        return Err(InsarError::Extraction(format!(
            "{} is not a zip archive (server may have returned an error page)",
            archive.display()
        )));
    }

    let file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file)
        .map_err(|e| InsarError::Extraction(format!("{}: {}", archive.display(), e)))?;
    let entries = zip.len();
    zip.extract(dest)
        .map_err(|e| InsarError::Extraction(format!("{}: {}", archive.display(), e)))?;
    Ok(entries)
}

fn is_zip_file(path: &Path) -> InsarResult<bool> {
    let mut magic = [0u8; 4];
    let mut file = File::open(path)?;
    let read = file.read(&mut magic)?;
    Ok(read == 4 && magic == [0x50, 0x4B, 0x03, 0x04]) // ZIP magic signature
}
