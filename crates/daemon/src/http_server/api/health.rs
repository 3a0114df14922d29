use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use http::StatusCode;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use super::client::{endpoint, ApiRequest};

pub const HEALTH_MESSAGE: &str = "Sealdrop backend is running";

#[derive(Debug, Clone, Default)]
pub struct HealthRequest;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub timestamp: String,
}

#[tracing::instrument]
pub async fn handler() -> Response {
    let response = HealthResponse {
        status: "ok".to_string(),
        message: HEALTH_MESSAGE.to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    };
    (StatusCode::OK, Json(response)).into_response()
}

impl ApiRequest for HealthRequest {
    type Response = HealthResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        client.get(endpoint(base_url, &["api", "health"]))
    }
}
