use std::path::PathBuf;

use clap::Args;
use url::Url;

use common::prelude::Envelope;
use sealdrop_daemon::http_server::api::client::{ApiClient, ApiError};
use sealdrop_daemon::http_server::api::secret::ConsumeRequest;

use super::input::{load_own_key, KeyFileError};
use super::open::{deliver, OpenError};

/// Fetch a one-time secret and decrypt it with our key
#[derive(Args, Debug, Clone)]
pub struct Receive {
    /// Secret link (http://host/api/secret/<id>) or bare id
    pub link: String,

    /// Write the plaintext here instead of printing it
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum ReceiveError {
    #[error(transparent)]
    Key(#[from] KeyFileError),
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    #[error(transparent)]
    Open(#[from] OpenError),
    #[error("no secret id in link: {0}")]
    InvalidLink(String),
}

/// Split a link into the server it points at and the secret id.
/// A bare id carries no server. Any path prefix in front of `api/secret/<id>` stays
/// part of the server address.
fn parse_link(link: &str) -> Result<(Option<Url>, String), ReceiveError> {
    let link = link.trim();
    let Ok(mut url) = Url::parse(link) else {
        return Ok((None, link.to_string()));
    };
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ReceiveError::InvalidLink(link.to_string()));
    }

    let (id, base_path) = {
        let segments: Vec<&str> = url
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();
        let (id, prefix) = segments
            .split_last()
            .ok_or_else(|| ReceiveError::InvalidLink(link.to_string()))?;
        let prefix = prefix
            .strip_suffix(&["api", "secret"][..])
            .unwrap_or(prefix);
        let base_path: String = prefix.iter().map(|s| format!("/{}", s)).collect();
        (id.to_string(), format!("{}/", base_path))
    };

    url.set_path(&base_path);
    url.set_query(None);
    url.set_fragment(None);
    Ok((Some(url), id))
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Receive {
    type Error = ReceiveError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let key = load_own_key(ctx.config_path.clone())?;
        let (remote, id) = parse_link(&self.link)?;

        let mut client = match remote {
            Some(remote) => ApiClient::new(&remote)?,
            None => ctx.client.clone(),
        };
        let envelope: Envelope = client.call(ConsumeRequest { id }).await?;

        Ok(deliver(&envelope, &key, self.output.as_deref())?)
    }
}
