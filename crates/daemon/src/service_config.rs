use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::state::AppConfig;

#[derive(Debug, Clone)]
pub struct Config {
    // http server configuration
    /// Port for the HTTP server
    pub port: u16,
    /// External base URL for generated secret links,
    ///  if not set then http://localhost:<port> is used
    pub public_url: Option<Url>,
    /// Maximum request body size in bytes
    pub body_limit_bytes: usize,

    // secret store configuration
    /// Time-to-live applied when a request omits one
    pub default_ttl: Duration,
    /// Shortest accepted time-to-live
    pub min_ttl: Duration,
    /// Longest accepted time-to-live
    pub max_ttl: Duration,
    /// Whether expired secrets are reported as 410 rather than 404
    pub disclose_expiry: bool,
    /// Interval between sweeps of expired records
    pub sweep_interval: Duration,

    // logging
    pub log_level: tracing::Level,
    /// Directory for log files (optional, logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for Config {
    fn from(app: &AppConfig) -> Self {
        Self {
            port: app.port,
            public_url: app.public_url.clone(),
            body_limit_bytes: app.body_limit_bytes,
            default_ttl: minutes(app.default_ttl_minutes),
            min_ttl: minutes(app.min_ttl_minutes),
            max_ttl: minutes(app.max_ttl_minutes),
            disclose_expiry: app.disclose_expiry,
            sweep_interval: Duration::from_secs(app.sweep_interval_secs),
            log_level: tracing::Level::INFO,
            log_dir: None,
        }
    }
}

fn minutes(n: u64) -> Duration {
    Duration::from_secs(n.saturating_mul(60))
}
