use std::net::SocketAddr;
use std::time::Duration;

use url::Url;

use crate::ServiceConfig;

/// Time-to-live applied when a create request omits `ttlMinutes`
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);
/// Maximum request body size in bytes (10 MiB)
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    // Listen address
    pub listen_addr: SocketAddr,
    // Base for the links handed back to senders
    pub public_url: Url,
    // log level for http tracing
    pub log_level: tracing::Level,
    pub default_ttl: Duration,
    // 410 for expired secrets when set, otherwise a uniform 404
    pub disclose_expiry: bool,
    pub body_limit_bytes: usize,
}

impl Config {
    pub fn new(listen_addr: SocketAddr, public_url: Option<Url>) -> Result<Self, ConfigError> {
        let public_url = match public_url {
            Some(url) => url,
            None => Url::parse(&format!("http://localhost:{}", listen_addr.port()))?,
        };
        if !matches!(public_url.scheme(), "http" | "https") || public_url.cannot_be_a_base() {
            return Err(ConfigError::PublicUrl(public_url.to_string()));
        }
        tracing::info!(
            "Creating HTTP server Config: listen_addr={}, public_url={}",
            listen_addr,
            public_url
        );
        Ok(Self {
            listen_addr,
            public_url,
            log_level: tracing::Level::INFO,
            default_ttl: DEFAULT_TTL,
            disclose_expiry: true,
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
        })
    }

    pub fn from_service_config(
        listen_addr: SocketAddr,
        service_config: &ServiceConfig,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::new(listen_addr, service_config.public_url.clone())?;
        config.default_ttl = service_config.default_ttl;
        config.disclose_expiry = service_config.disclose_expiry;
        config.body_limit_bytes = service_config.body_limit_bytes;
        config.log_level = service_config.log_level;
        Ok(config)
    }

    /// Link at which the secret stored under `id` can be fetched once
    pub fn secret_url(&self, id: &str) -> String {
        format!(
            "{}/api/secret/{}",
            self.public_url.as_str().trim_end_matches('/'),
            id
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("public url must be an http(s) base URL: {0}")]
    PublicUrl(String),
}
