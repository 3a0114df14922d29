use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use chrono::SecondsFormat;
use http::StatusCode;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::prelude::{Envelope, EnvelopeError};
use secret_store::StoreError;

use super::super::error_response;
use crate::http_server::api::client::{endpoint, ApiRequest};
use crate::http_server::Config;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    /// The sealed message; browsers send it as `encryptedPackage`
    #[serde(default, alias = "encryptedPackage")]
    pub envelope: Option<Envelope>,
    /// Minutes until the link stops working (server default if omitted)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_minutes: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResponse {
    pub success: bool,
    pub id: String,
    pub url: String,
    pub expires_at: String,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Extension(config): Extension<Config>,
    payload: Result<Json<CreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, CreateError> {
    let Json(req) = payload?;

    let envelope = req.envelope.ok_or(CreateError::MissingEnvelope)?;
    envelope.validate()?;

    let ttl = match req.ttl_minutes {
        None => config.default_ttl,
        Some(minutes) if minutes > 0 => Duration::from_secs((minutes as u64).saturating_mul(60)),
        Some(minutes) => return Err(CreateError::InvalidTtl(minutes)),
    };

    let receipt = state.secrets().create(envelope, ttl)?;
    let url = config.secret_url(receipt.id.as_str());

    Ok((
        StatusCode::OK,
        Json(CreateResponse {
            success: true,
            id: receipt.id.to_string(),
            url,
            expires_at: receipt
                .expires_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        }),
    ))
}

#[derive(Debug, thiserror::Error)]
pub enum CreateError {
    #[error("Invalid JSON body: {0}")]
    Payload(#[from] JsonRejection),
    #[error("Missing encryptedPackage in request body")]
    MissingEnvelope,
    #[error("Invalid encryptedPackage format: {0}")]
    InvalidEnvelope(#[from] EnvelopeError),
    #[error("ttlMinutes must be a positive number of minutes, got {0}")]
    InvalidTtl(i64),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for CreateError {
    fn into_response(self) -> Response {
        match &self {
            CreateError::Payload(rejection) => {
                tracing::debug!("create rejected: {}", rejection.body_text());
                let status = match rejection.status() {
                    StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
                    _ => StatusCode::BAD_REQUEST,
                };
                error_response(status, self.to_string())
            }
            CreateError::MissingEnvelope
            | CreateError::InvalidEnvelope(_)
            | CreateError::InvalidTtl(_)
            | CreateError::Store(StoreError::InvalidTtl { .. }) => {
                tracing::debug!("create rejected: {}", self);
                error_response(StatusCode::BAD_REQUEST, self.to_string())
            }
            CreateError::Store(e) => {
                tracing::error!("create failed: {}", e);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
            }
        }
    }
}

// Client implementation - builds request for this operation
impl ApiRequest for CreateRequest {
    type Response = CreateResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client
            .post(endpoint(base_url, &["api", "secret"]))
            .json(&self)
    }
}
