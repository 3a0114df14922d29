use std::time::Duration;

use common::prelude::Envelope;
use secret_store::{SecretStore, StoreConfig};

use super::service_config::Config;

/// Main service state, shared by every request handler
#[derive(Clone, Debug)]
pub struct State {
    secrets: SecretStore<Envelope>,
}

impl State {
    pub fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        if config.min_ttl.is_zero() || config.min_ttl > config.max_ttl {
            return Err(StateSetupError::InvalidTtlBounds {
                min: config.min_ttl,
                max: config.max_ttl,
            });
        }
        if config.default_ttl < config.min_ttl || config.default_ttl > config.max_ttl {
            return Err(StateSetupError::InvalidDefaultTtl(config.default_ttl));
        }
        if config.sweep_interval.is_zero() {
            return Err(StateSetupError::InvalidSweepInterval);
        }

        let store_config = StoreConfig {
            min_ttl: config.min_ttl,
            max_ttl: config.max_ttl,
            ..StoreConfig::default()
        };
        tracing::info!(
            min_ttl_secs = store_config.min_ttl.as_secs(),
            max_ttl_secs = store_config.max_ttl.as_secs(),
            "secret store ready"
        );

        Ok(Self::new(SecretStore::new(store_config)))
    }

    pub fn new(secrets: SecretStore<Envelope>) -> Self {
        Self { secrets }
    }

    pub fn secrets(&self) -> &SecretStore<Envelope> {
        &self.secrets
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("invalid ttl bounds: min {min:?}, max {max:?}")]
    InvalidTtlBounds { min: Duration, max: Duration },
    #[error("default ttl {0:?} is outside the configured bounds")]
    InvalidDefaultTtl(Duration),
    #[error("sweep interval must be non-zero")]
    InvalidSweepInterval,
}
