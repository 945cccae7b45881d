// Application state module
// Read-only configuration plus the shared request counters

use std::path::PathBuf;
use std::sync::Arc;

use super::types::{Config, FsConfig};
use crate::logger::LogFormat;
use crate::stats::FsCounters;

/// Application state, shared by `Arc` with every connection task
pub struct AppState {
    pub config: Config,
    /// Canonical form of `config.fs.root`, resolved once at startup
    pub root: PathBuf,
    pub counters: Arc<FsCounters>,
    pub access_log_format: LogFormat,
}

impl AppState {
    /// Fails when the root directory does not exist or is not a directory
    pub fn new(config: Config, counters: Arc<FsCounters>) -> std::io::Result<Self> {
        let root = config.fs.root.canonicalize()?;
        if !root.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a directory", root.display()),
            ));
        }
        let access_log_format = LogFormat::parse(&config.logging.access_log_format);
        Ok(Self {
            config,
            root,
            counters,
            access_log_format,
        })
    }

    pub const fn fs(&self) -> &FsConfig {
        &self.config.fs
    }
}
