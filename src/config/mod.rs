// Configuration module entry point
// Layered configuration (defaults, file, environment, command line) and the
// shared runtime state built from it

mod state;
mod types;

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

// Re-export public types
pub use state::AppState;
pub use types::{Config, FsConfig, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig};

/// Values given on the command line; each one overrides file and environment
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub addr: Option<String>,
    pub dir: Option<PathBuf>,
    pub byte_range: Option<bool>,
}

impl Config {
    /// Load configuration from specified file path (extension optional).
    /// A missing file is not an error; defaults and environment still apply.
    pub fn load_from(config_path: &str, overrides: &Overrides) -> Result<Self, config::ConfigError> {
        Self::load_with_env(config_path, overrides, env_source())
    }

    fn load_with_env(
        config_path: &str,
        overrides: &Overrides,
        env: config::Environment,
    ) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(env)
            .set_default("server.addr", "127.0.0.1:8080")?
            .set_default("server.stats_addr", "127.0.0.1:8081")?
            .set_default("server.stats_enabled", true)?
            .set_default("fs.root", "./public")?
            .set_default("fs.index_names", vec!["index.html"])?
            .set_default("fs.generate_index_pages", true)?
            .set_default("fs.compress", false)?
            .set_default("fs.byte_range", false)?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.connection_timeout", 0)?
            .set_default("http.server_name", concat!("fsd/", env!("CARGO_PKG_VERSION")))?
            .set_override_option("server.addr", overrides.addr.clone())?
            .set_override_option(
                "fs.root",
                overrides
                    .dir
                    .as_ref()
                    .map(|d| d.to_string_lossy().into_owned()),
            )?
            .set_override_option("fs.byte_range", overrides.byte_range)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        parse_listen_addr(&self.server.addr)
    }

    pub fn get_stats_socket_addr(&self) -> Result<SocketAddr, String> {
        parse_listen_addr(&self.server.stats_addr)
    }
}

/// `FSD_SECTION__KEY` variables, e.g. `FSD_FS__BYTE_RANGE=true`
fn env_source() -> config::Environment {
    config::Environment::with_prefix("FSD")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// Parse `host:port`; a bare `:port` listens on all interfaces
fn parse_listen_addr(addr: &str) -> Result<SocketAddr, String> {
    let full = if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr.to_string()
    };

    full.to_socket_addrs()
        .map_err(|e| format!("Invalid address '{addr}': {e}"))?
        .next()
        .ok_or_else(|| format!("Address '{addr}' did not resolve"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let cfg = Config::load_from("does-not-exist/fsd", &Overrides::default()).unwrap();
        assert_eq!(cfg.server.addr, "127.0.0.1:8080");
        assert_eq!(cfg.fs.index_names, vec!["index.html".to_string()]);
        assert!(cfg.fs.generate_index_pages);
        assert!(!cfg.fs.compress);
        assert!(!cfg.fs.byte_range);
        assert!(cfg.logging.access_log);
        assert_eq!(cfg.performance.max_connections, None);
        assert_eq!(cfg.performance.connection_timeout, 0);
    }

    #[test]
    fn test_overrides_win() {
        let overrides = Overrides {
            addr: Some(":9000".to_string()),
            dir: Some(PathBuf::from("/srv/www")),
            byte_range: Some(true),
        };
        let cfg = Config::load_from("does-not-exist/fsd", &overrides).unwrap();
        assert_eq!(cfg.server.addr, ":9000");
        assert_eq!(cfg.fs.root, PathBuf::from("/srv/www"));
        assert!(cfg.fs.byte_range);
        assert_eq!(
            cfg.get_socket_addr().unwrap(),
            "0.0.0.0:9000".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fsd.toml");
        std::fs::write(
            &path,
            r#"
[fs]
root = "/var/www"
index_names = ["index.htm", "default.html"]
byte_range = true

[performance]
max_connections = 512
"#,
        )
        .unwrap();

        let cfg = Config::load_from(path.to_str().unwrap(), &Overrides::default()).unwrap();
        assert_eq!(cfg.fs.root, PathBuf::from("/var/www"));
        assert_eq!(cfg.fs.index_names, vec!["index.htm", "default.html"]);
        assert!(cfg.fs.byte_range);
        assert_eq!(cfg.performance.max_connections, Some(512));
    }

    #[test]
    fn test_environment_layer() {
        let vars: config::Map<String, String> = [
            ("FSD_FS__BYTE_RANGE", "true"),
            ("FSD_SERVER__ADDR", "0.0.0.0:9090"),
            ("FSD_PERFORMANCE__MAX_CONNECTIONS", "64"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let env = env_source().source(Some(vars.clone()));
        let cfg = Config::load_with_env("does-not-exist/fsd", &Overrides::default(), env).unwrap();
        assert!(cfg.fs.byte_range);
        assert_eq!(cfg.server.addr, "0.0.0.0:9090");
        assert_eq!(cfg.performance.max_connections, Some(64));

        // Command-line values still win over the environment
        let overrides = Overrides {
            addr: Some("127.0.0.1:7000".to_string()),
            byte_range: Some(false),
            ..Overrides::default()
        };
        let env = env_source().source(Some(vars));
        let cfg = Config::load_with_env("does-not-exist/fsd", &overrides, env).unwrap();
        assert!(!cfg.fs.byte_range);
        assert_eq!(cfg.server.addr, "127.0.0.1:7000");
    }

    #[test]
    fn test_parse_listen_addr() {
        assert_eq!(
            parse_listen_addr("127.0.0.1:8080").unwrap(),
            "127.0.0.1:8080".parse::<SocketAddr>().unwrap()
        );
        assert!(parse_listen_addr("not an address").is_err());
    }
}
