//! Runtime configuration: Earthdata credentials, default locations, and
//! log-directory resolution.

use crate::types::{InsarError, InsarResult};
use std::env;
use std::path::PathBuf;

/// Environment variable holding the Earthdata login name.
pub const USERNAME_ENV: &str = "EARTHDATA_USERNAME";
/// Environment variable holding the Earthdata password.
pub const PASSWORD_ENV: &str = "EARTHDATA_PASSWORD";
/// Environment variable overriding the log directory.
pub const LOG_DIR_ENV: &str = "INSAR_LOG_DIR";

/// Default directory for downloaded scene archives.
pub const DEFAULT_DATA_DIR: &str = "/opt/data/SAFE";
/// Default directory for processing outputs.
pub const DEFAULT_OUT_DIR: &str = "/opt/data/out";
/// Default location of the graph processing tool executable.
pub const DEFAULT_GPT_PATH: &str = "/opt/snap/bin/gpt";

/// Earthdata login credentials.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Read both credential variables from the environment. Either one
    /// missing or empty is a configuration failure.
    pub fn from_env() -> InsarResult<Self> {
        Ok(Credentials {
            username: required_env(USERNAME_ENV)?,
            password: required_env(PASSWORD_ENV)?,
        })
    }
}

// The password must never reach log output through a debug dump.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

fn required_env(var: &str) -> InsarResult<String> {
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(InsarError::Configuration(format!("{} is not set", var))),
    }
}

/// Directory receiving per-binary log files.
///
/// `INSAR_LOG_DIR` wins when set; otherwise the platform cache directory,
/// falling back to `./logs` on systems without one.
pub fn log_dir() -> PathBuf {
    if let Ok(dir) = env::var(LOG_DIR_ENV) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::cache_dir()
        .map(|base| base.join("sarpair").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}
