use clap::{Args, ValueEnum};

use sealdrop_daemon::state::{AppState, StateError};

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyFormat {
    /// JSON Web Key, as browsers import it
    #[default]
    Jwk,
    /// SubjectPublicKeyInfo PEM
    Pem,
    /// Hex SHA-256 of the DER-encoded public key
    Fingerprint,
}

/// Print this installation's public key, for senders to encrypt to
#[derive(Args, Debug, Clone)]
pub struct Key {
    #[arg(long, value_enum, default_value_t = KeyFormat::Jwk)]
    pub format: KeyFormat,
}

#[derive(Debug, thiserror::Error)]
pub enum KeyOpError {
    #[error("state error: {0}")]
    State(#[from] StateError),
    #[error("failed to encode key: {0}")]
    Encode(#[from] common::crypto::KeyError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Key {
    type Error = KeyOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::load(ctx.config_path.clone())?;
        let public = state.load_public_key()?;

        let output = match self.format {
            KeyFormat::Jwk => public.to_jwk_string()?,
            KeyFormat::Pem => public.to_pem()?.trim_end().to_string(),
            KeyFormat::Fingerprint => public.fingerprint()?,
        };
        Ok(output)
    }
}
