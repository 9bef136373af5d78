// Configuration module entry point
// Loads the immutable process-wide configuration from file and environment

mod types;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

// Re-export public types
pub use types::{Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig, SiteConfig};

impl Config {
    /// Load configuration from `config.toml` (optional) plus the environment.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from the specified file path (without extension).
    ///
    /// Precedence, lowest to highest: built-in defaults, the config file,
    /// `SITE_*` environment overrides, and finally the platform-provided
    /// `PORT` variable.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("SITE").separator("__"))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("site.root_dir", "site")?
            .set_default("site.root_document", "index.html")?
            .set_default("site.service_name", "rantilini-portfolio-modern")?
            .set_default("site.fail_fast", false)?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("http.enable_cors", true)?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .build()?;

        let mut cfg: Self = settings.try_deserialize()?;

        if let Ok(port) = std::env::var("PORT") {
            cfg.server.port = parse_port(&port)?;
        }

        Ok(cfg)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Filesystem path of the root document inside the served tree.
    pub fn root_document_path(&self) -> PathBuf {
        Path::new(&self.site.root_dir).join(&self.site.root_document)
    }

    /// Check that the root document exists on disk.
    ///
    /// Callers decide whether a failure is fatal (`site.fail_fast`) or just
    /// worth a startup warning.
    pub fn ensure_root_document(&self) -> Result<(), String> {
        let path = self.root_document_path();
        if path.is_file() {
            Ok(())
        } else {
            Err(format!("Root document '{}' not found", path.display()))
        }
    }
}

/// Parse the `PORT` environment variable value.
fn parse_port(raw: &str) -> Result<u16, config::ConfigError> {
    raw.parse()
        .map_err(|e| config::ConfigError::Message(format!("invalid PORT value '{raw}': {e}")))
}
