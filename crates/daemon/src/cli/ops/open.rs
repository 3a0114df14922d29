use std::path::PathBuf;

use clap::Args;

use common::prelude::{Envelope, EnvelopeError};

use super::input::{load_own_key, KeyFileError};

/// Decrypt an envelope addressed to our key
#[derive(Args, Debug, Clone)]
pub struct Open {
    /// File containing the envelope JSON
    #[arg(long)]
    pub envelope: PathBuf,

    /// Write the plaintext here instead of printing it
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error(transparent)]
    Key(#[from] KeyFileError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid envelope JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
}

/// Print the plaintext, or write it to `output` when given
pub(crate) fn deliver(
    envelope: &Envelope,
    key: &common::prelude::SecretKey,
    output: Option<&std::path::Path>,
) -> Result<String, OpenError> {
    match output {
        Some(path) => {
            let plaintext = envelope.open(key)?;
            std::fs::write(path, &plaintext)?;
            Ok(format!(
                "Wrote {} bytes to {}",
                plaintext.len(),
                path.display()
            ))
        }
        None => Ok(envelope.open_to_string(key)?),
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Open {
    type Error = OpenError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let key = load_own_key(ctx.config_path.clone())?;
        let text = std::fs::read_to_string(&self.envelope)?;
        let envelope: Envelope = serde_json::from_str(&text)?;

        deliver(&envelope, &key, self.output.as_deref())
    }
}
