use std::path::{Path, PathBuf};

use clap::Args;

use common::prelude::{PublicKey, SecretKey};
use sealdrop_daemon::state::{AppState, StateError};

/// Plaintext given either inline or as a file
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct Plaintext {
    /// Message text to encrypt
    #[arg(long)]
    pub message: Option<String>,

    /// File whose contents to encrypt
    #[arg(long)]
    pub file: Option<PathBuf>,
}

impl Plaintext {
    pub fn read(&self) -> std::io::Result<Vec<u8>> {
        match (&self.message, &self.file) {
            (Some(message), _) => Ok(message.clone().into_bytes()),
            (None, Some(path)) => std::fs::read(path),
            (None, None) => Ok(Vec::new()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum KeyFileError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid recipient key in {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
    #[error("state error: {0}")]
    State(#[from] StateError),
}

/// Recipient key from a JWK or PEM file, or our own public key if no file is given
pub fn load_recipient(
    path: Option<&Path>,
    config_path: Option<PathBuf>,
) -> Result<PublicKey, KeyFileError> {
    let Some(path) = path else {
        let state = AppState::load(config_path)?;
        return Ok(state.load_public_key()?);
    };

    let text = std::fs::read_to_string(path).map_err(|source| KeyFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    PublicKey::decode(&text).map_err(|e| KeyFileError::Invalid {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Our own private key
pub fn load_own_key(config_path: Option<PathBuf>) -> Result<SecretKey, KeyFileError> {
    let state = AppState::load(config_path)?;
    Ok(state.load_key()?)
}
