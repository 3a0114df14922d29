use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use http::{header, StatusCode};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::prelude::Envelope;
use secret_store::StoreError;

use super::super::error_response;
use crate::http_server::api::client::{endpoint, ApiRequest};
use crate::http_server::Config;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumeRequest {
    /// Id of the secret, as found at the end of its link
    pub id: String,
}

/// Hand out the stored envelope exactly once.
pub async fn handler(
    State(state): State<ServiceState>,
    Extension(config): Extension<Config>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Response, ConsumeError> {
    // An id that does not even decode cannot name a stored secret
    let Path(id) = id.map_err(|rejection| {
        tracing::debug!("consume rejected: {}", rejection.body_text());
        ConsumeError::NotFound
    })?;
    let envelope = state
        .secrets()
        .consume(&id)
        .map_err(|e| ConsumeError::from_store(e, config.disclose_expiry))?;

    Ok((
        StatusCode::OK,
        [(header::CACHE_CONTROL, "no-store")],
        Json(envelope),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum ConsumeError {
    #[error("Secret not found. It may have already been accessed or expired.")]
    NotFound,
    #[error("Secret has expired. Please request a new one.")]
    Expired,
    #[error("store error: {0}")]
    Store(StoreError),
}

impl ConsumeError {
    fn from_store(err: StoreError, disclose_expiry: bool) -> Self {
        match err {
            StoreError::NotFound => ConsumeError::NotFound,
            StoreError::Gone if disclose_expiry => ConsumeError::Expired,
            StoreError::Gone => ConsumeError::NotFound,
            e => ConsumeError::Store(e),
        }
    }
}

impl IntoResponse for ConsumeError {
    fn into_response(self) -> Response {
        match self {
            ConsumeError::NotFound => error_response(StatusCode::NOT_FOUND, self.to_string()),
            ConsumeError::Expired => error_response(StatusCode::GONE, self.to_string()),
            ConsumeError::Store(e) => {
                tracing::error!("consume failed: {}", e);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
            }
        }
    }
}

impl ApiRequest for ConsumeRequest {
    type Response = Envelope;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.get(endpoint(base_url, &["api", "secret", &self.id]))
    }
}
