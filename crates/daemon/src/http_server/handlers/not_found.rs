use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;

pub async fn not_found_handler(method: Method, uri: Uri) -> Response {
    tracing::debug!(%method, path = uri.path(), "no route");
    let body = serde_json::json!({
        "error": "Endpoint not found",
        "path": uri.path(),
        "method": method.as_str(),
    });
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}
