use std::path::PathBuf;

use clap::Args;

use common::prelude::{Envelope, EnvelopeError};

use super::input::{load_recipient, KeyFileError, Plaintext};

/// Encrypt a message locally and print the envelope JSON
#[derive(Args, Debug, Clone)]
pub struct Seal {
    /// Recipient public key file (JWK or PEM); defaults to our own key
    #[arg(long)]
    pub recipient: Option<PathBuf>,

    #[command(flatten)]
    pub input: Plaintext,
}

#[derive(Debug, thiserror::Error)]
pub enum SealError {
    #[error(transparent)]
    Key(#[from] KeyFileError),
    #[error("failed to read input: {0}")]
    Input(#[from] std::io::Error),
    #[error("failed to seal message: {0}")]
    Envelope(#[from] EnvelopeError),
    #[error("failed to encode envelope: {0}")]
    Json(#[from] serde_json::Error),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Seal {
    type Error = SealError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let recipient = load_recipient(self.recipient.as_deref(), ctx.config_path.clone())?;
        let plaintext = self.input.read()?;

        let envelope = Envelope::seal(&recipient, plaintext)?;
        Ok(serde_json::to_string_pretty(&envelope)?)
    }
}
