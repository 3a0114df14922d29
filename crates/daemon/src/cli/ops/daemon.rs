use clap::Args;
use url::Url;

use sealdrop_daemon::state::{AppConfig, AppState, StateError};
use sealdrop_daemon::{spawn_service, ServiceConfig};

/// Run the one-time secret server
#[derive(Args, Debug, Clone)]
pub struct Daemon {
    /// Override HTTP server port (default from config)
    #[arg(long)]
    pub port: Option<u16>,

    /// Base URL for generated links (e.g., https://drop.example.com)
    #[arg(long)]
    pub public_url: Option<Url>,

    /// Answer 404 for expired secrets so they are indistinguishable from unknown ids
    #[arg(long)]
    pub hardened: bool,

    /// Default log level (RUST_LOG takes precedence)
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    /// Directory for log files (logs to stdout only if not set)
    #[arg(long)]
    pub log_dir: Option<std::path::PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("state error: {0}")]
    StateError(#[from] StateError),
}

impl Daemon {
    fn service_config(&self, app: &AppConfig) -> ServiceConfig {
        let mut config = ServiceConfig::from(app);
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(url) = &self.public_url {
            config.public_url = Some(url.clone());
        }
        if self.hardened {
            config.disclose_expiry = false;
        }
        config.log_level = self.log_level;
        config.log_dir = self.log_dir.clone();
        config
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Daemon {
    type Error = DaemonError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        // The server never needs the private key, so an uninitialized directory just means defaults
        let app = match AppState::load(ctx.config_path.clone()) {
            Ok(state) => state.config,
            Err(StateError::NotInitialized) => AppConfig::default(),
            Err(e) => return Err(e.into()),
        };

        let config = self.service_config(&app);
        spawn_service(&config).await;
        Ok("daemon ended".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_file_values() {
        let app = AppConfig {
            port: 4000,
            ..AppConfig::default()
        };
        let daemon = Daemon {
            port: Some(5000),
            public_url: None,
            hardened: true,
            log_level: tracing::Level::DEBUG,
            log_dir: None,
        };

        let config = daemon.service_config(&app);
        assert_eq!(config.port, 5000);
        assert!(!config.disclose_expiry);
        assert_eq!(config.log_level, tracing::Level::DEBUG);
        assert_eq!(config.default_ttl, std::time::Duration::from_secs(3600));
    }
}
