use clap::Args;
use url::Url;

use common::crypto::DEFAULT_MODULUS_BITS;
use sealdrop_daemon::state::{AppConfig, AppState};

/// Create the config directory with a fresh keypair
#[derive(Args, Debug, Clone)]
pub struct Init {
    /// HTTP server port
    #[arg(long, default_value = "3000")]
    pub port: u16,

    /// Externally reachable base URL used in generated links
    #[arg(long)]
    pub public_url: Option<Url>,

    /// RSA modulus size in bits (at least 2048)
    #[arg(long, default_value_t = DEFAULT_MODULUS_BITS)]
    pub bits: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] sealdrop_daemon::state::StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = AppConfig {
            port: self.port,
            public_url: self.public_url.clone(),
            ..AppConfig::default()
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config), Some(self.bits))?;
        let fingerprint = state
            .load_public_key()
            .and_then(|key| {
                key.fingerprint()
                    .map_err(|e| sealdrop_daemon::state::StateError::InvalidKey(e.to_string()))
            })?;

        let output = format!(
            "Initialized sealdrop directory at: {}\n\
             - Private key: {}\n\
             - Public key: {}\n\
             - Config: {}\n\
             - Port: {}\n\
             - Fingerprint: {}",
            state.sealdrop_dir.display(),
            state.key_path.display(),
            state.public_key_path.display(),
            state.config_path.display(),
            state.config.port,
            fingerprint
        );

        Ok(output)
    }
}
