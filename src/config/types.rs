// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub fs: FsConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
}

/// Listener configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// File listener, `host:port` or `:port`
    pub addr: String,
    /// Stats listener, `host:port` or `:port`
    pub stats_addr: String,
    pub stats_enabled: bool,
    pub workers: Option<usize>,
}

/// File serving configuration, read-only after startup
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct FsConfig {
    /// Directory all files are served from
    pub root: PathBuf,
    /// Tried in order when a directory is requested
    pub index_names: Vec<String>,
    /// Render an HTML listing for directories without an index file
    pub generate_index_pages: bool,
    /// Accepted for compatibility; responses are never compressed
    pub compress: bool,
    /// Honor `Range` request headers
    pub byte_range: bool,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./public"),
            index_names: vec!["index.html".to_string()],
            generate_index_pages: true,
            compress: false,
            byte_range: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive: bool,
    /// Upper bound on a connection's lifetime in seconds, including time
    /// spent streaming bodies (0, the default, disables it)
    pub connection_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
}
