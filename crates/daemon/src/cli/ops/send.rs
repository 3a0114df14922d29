use std::path::PathBuf;

use clap::Args;

use common::prelude::{Envelope, EnvelopeError};
use sealdrop_daemon::http_server::api::client::ApiError;
use sealdrop_daemon::http_server::api::secret::{CreateRequest, CreateResponse};

use super::input::{load_recipient, KeyFileError, Plaintext};

/// Encrypt a message and upload it, printing a one-time link
#[derive(Args, Debug, Clone)]
pub struct SendMessage {
    /// Recipient public key file (JWK or PEM); defaults to our own key
    #[arg(long)]
    pub recipient: Option<PathBuf>,

    #[command(flatten)]
    pub input: Plaintext,

    /// Minutes until the link stops working (server default if omitted)
    #[arg(long)]
    pub ttl_minutes: Option<i64>,
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error(transparent)]
    Key(#[from] KeyFileError),
    #[error("failed to read input: {0}")]
    Input(#[from] std::io::Error),
    #[error("failed to seal message: {0}")]
    Envelope(#[from] EnvelopeError),
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for SendMessage {
    type Error = SendError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let recipient = load_recipient(self.recipient.as_deref(), ctx.config_path.clone())?;
        let plaintext = self.input.read()?;
        let envelope = Envelope::seal(&recipient, plaintext)?;

        let request = CreateRequest {
            envelope: Some(envelope),
            ttl_minutes: self.ttl_minutes,
        };
        let mut client = ctx.client.clone();
        let response: CreateResponse = client.call(request).await?;

        Ok(format!(
            "{}\nexpires at {} (link works once)",
            response.url, response.expires_at
        ))
    }
}
