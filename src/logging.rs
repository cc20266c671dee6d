//! Logger construction for the pipeline binaries.
//!
//! Each binary builds its logger once, explicitly, from a [`LogConfig`];
//! library code only emits through the `log` facade macros. Records go to
//! stderr and, when the log directory is writable, to `<dir>/<name>.log`.

use crate::config;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

/// Where a binary's log file lives.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Stem of the log file, normally the binary name
    pub name: String,
    /// Directory receiving `<name>.log`
    pub directory: PathBuf,
}

impl LogConfig {
    /// Config for a named binary using the resolved log directory
    /// (`INSAR_LOG_DIR` override, then the platform cache directory).
    pub fn for_binary(name: &str) -> Self {
        LogConfig {
            name: name.to_string(),
            directory: config::log_dir(),
        }
    }
}

/// Duplicates every formatted record to stderr and the log file.
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

/// Build and install the process logger described by `cfg`.
///
/// Honors `RUST_LOG`, defaulting to `info`. An unwritable log directory
/// degrades to stderr-only logging instead of aborting the run. Returns
/// the log-file path when one was opened.
pub fn init(cfg: &LogConfig) -> Option<PathBuf> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));

    let opened = open_log_file(cfg);
    let path = match &opened {
        Ok((_, path)) => Some(path.clone()),
        Err(_) => None,
    };
    if let Ok((file, _)) = opened {
        builder.target(env_logger::Target::Pipe(Box::new(Tee { file })));
    }

    // Tolerate a logger installed earlier in the same process (tests).
    let _ = builder.try_init();

    match path {
        Some(path) => {
            log::debug!("Logging to {}", path.display());
            Some(path)
        }
        None => {
            log::warn!(
                "Cannot open log file under {}; logging to stderr only",
                cfg.directory.display()
            );
            None
        }
    }
}

/// Convenience wrapper for binaries: `init` with the default directory.
pub fn init_for(name: &str) -> Option<PathBuf> {
    init(&LogConfig::for_binary(name))
}

fn open_log_file(cfg: &LogConfig) -> io::Result<(File, PathBuf)> {
    fs::create_dir_all(&cfg.directory)?;
    let path = cfg.directory.join(format!("{}.log", cfg.name));
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((file, path))
}
