// Configuration types
// The process-wide configuration is deserialized once at startup and never
// mutated afterwards; handlers receive it behind an Arc.

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub site: SiteConfig,
    pub logging: LoggingConfig,
    pub http: HttpConfig,
    pub performance: PerformanceConfig,
}

/// Listener configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Tokio worker thread count; CPU core count when unset
    pub workers: Option<usize>,
}

/// What gets served and the identity reported by the liveness endpoint
#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    /// The only directory ever resolved against; nothing outside it is
    /// reachable over HTTP
    pub root_dir: String,
    /// Document returned for `/`, relative to `root_dir`
    pub root_document: String,
    /// `service` field of the `/health` payload
    pub service_name: String,
    /// Treat a missing root document as a fatal startup error
    pub fail_fast: bool,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub access_log: bool,
    /// Access log format: combined, common, or json
    pub access_log_format: String,
    /// Access log file path (stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub enable_cors: bool,
    pub max_body_size: u64,
}

/// Connection-level tuning
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}
