use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::prelude::{Envelope, SecretKey};
use sealdrop_daemon::http_server::{self, Config};
use sealdrop_daemon::ServiceState;
use secret_store::{SecretStore, StoreConfig};

struct TestApp {
    router: Router,
    store: SecretStore<Envelope>,
}

impl TestApp {
    fn new() -> Self {
        Self::with(|_| {})
    }

    fn with(configure: impl FnOnce(&mut Config)) -> Self {
        let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
        let mut config = Config::new(addr, None).unwrap();
        configure(&mut config);

        // Expiry is checked on access; reapers are left out so paused-clock tests are deterministic
        let store = SecretStore::new(StoreConfig {
            active_expiry: false,
            ..StoreConfig::default()
        });
        let router = http_server::router(config, ServiceState::new(store.clone()));
        Self { router, store }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, body)
    }

    async fn create(&self, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/secret")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, _, body) = self.send(request).await;
        (status, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, axum::http::HeaderMap, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }
}

fn package() -> Value {
    json!({
        "algorithm": "AES-256-GCM with RSA-2048-OAEP",
        "encryptedSymmetricKey": "d3JhcHBlZCBrZXk=",
        "iv": "AAECAwQFBgcICQoL",
        "ciphertext": "Y2lwaGVydGV4dCB3aXRoIHRhZw==",
        "timestamp": "2024-01-01T00:00:00.000Z"
    })
}

#[tokio::test]
async fn test_create_consume_then_not_found() {
    let app = TestApp::new();

    let (status, created) = app
        .create(json!({ "encryptedPackage": package(), "ttlMinutes": 60 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(id.len(), secret_store::ID_LENGTH);
    assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_eq!(
        created["url"],
        format!("http://localhost:3000/api/secret/{}", id)
    );
    assert!(created["expiresAt"].as_str().unwrap().ends_with('Z'));

    let (status, headers, body) = app.get(&format!("/api/secret/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CACHE_CONTROL], "no-store");
    // The stored envelope comes back untouched
    assert_eq!(body, package());

    let (status, _, body) = app.get(&format!("/api/secret/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn test_create_accepts_envelope_field_and_default_ttl() {
    let app = TestApp::new();
    let before = chrono::Utc::now();

    let (status, created) = app.create(json!({ "envelope": package() })).await;
    assert_eq!(status, StatusCode::OK);

    let expires_at: chrono::DateTime<chrono::Utc> =
        created["expiresAt"].as_str().unwrap().parse().unwrap();
    let ttl = expires_at - before;
    assert!(ttl >= chrono::Duration::minutes(59) && ttl <= chrono::Duration::minutes(61));
}

#[tokio::test]
async fn test_create_fills_in_default_algorithm() {
    let app = TestApp::new();
    let mut without_algorithm = package();
    without_algorithm.as_object_mut().unwrap().remove("algorithm");

    let (_, created) = app.create(json!({ "envelope": without_algorithm })).await;
    let (status, _, body) = app
        .get(&format!("/api/secret/{}", created["id"].as_str().unwrap()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["algorithm"], "AES-256-GCM with RSA-2048-OAEP");
}

#[tokio::test]
async fn test_create_missing_envelope() {
    let app = TestApp::new();

    let (status, body) = app.create(json!({ "ttlMinutes": 5 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing encryptedPackage in request body");
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn test_create_incomplete_envelope() {
    let app = TestApp::new();

    for field in ["encryptedSymmetricKey", "iv", "ciphertext"] {
        let mut incomplete = package();
        incomplete.as_object_mut().unwrap().remove(field);

        let (status, body) = app.create(json!({ "envelope": incomplete })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "missing {}", field);
        assert!(body["error"].as_str().unwrap().contains(field));
    }

    let mut not_base64 = package();
    not_base64["iv"] = json!("%%%");
    let (status, _) = app.create(json!({ "envelope": not_base64 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn test_create_invalid_ttl() {
    let app = TestApp::new();

    for ttl in [json!(0), json!(-5), json!(10081), json!("soon")] {
        let (status, body) = app
            .create(json!({ "envelope": package(), "ttlMinutes": ttl }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "ttl {}", ttl);
        assert!(body["error"].is_string());
    }

    let (status, _) = app
        .create(json!({ "envelope": package(), "ttlMinutes": 10080 }))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_create_malformed_json() {
    let app = TestApp::new();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/secret")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"envelope\": "))
        .unwrap();
    let (status, _, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/secret")
        .body(Body::from(json!({ "envelope": package() }).to_string()))
        .unwrap();
    let (status, _, _) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_body_limit() {
    let app = TestApp::with(|config| config.body_limit_bytes = 1024);

    let mut large = package();
    large["ciphertext"] = json!("A".repeat(4096));
    let (status, _) = app.create(json!({ "envelope": large })).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_unknown_and_malformed_ids() {
    let app = TestApp::new();

    let (status, _, _) = app
        .get("/api/secret/0123456789abcdefghijABCDEFGHIJ01")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = app.get("/api/secret/short").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_undecodable_id_is_json_not_found() {
    let app = TestApp::new();

    let (status, _, body) = app.get("/api/secret/%FF%FE").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().starts_with("Secret not found"));
}

#[tokio::test(start_paused = true)]
async fn test_expired_secret_is_gone() {
    let app = TestApp::new();

    let (_, created) = app
        .create(json!({ "envelope": package(), "ttlMinutes": 1 }))
        .await;
    tokio::time::advance(Duration::from_secs(2 * 60)).await;

    let uri = format!("/api/secret/{}", created["id"].as_str().unwrap());
    let (status, _, body) = app.get(&uri).await;
    assert_eq!(status, StatusCode::GONE);
    assert!(body["error"].as_str().unwrap().contains("expired"));
    assert!(app.store.is_empty());

    let (status, _, _) = app.get(&uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test(start_paused = true)]
async fn test_hardened_mode_hides_expiry() {
    let app = TestApp::with(|config| config.disclose_expiry = false);

    let (_, created) = app
        .create(json!({ "envelope": package(), "ttlMinutes": 1 }))
        .await;
    tokio::time::advance(Duration::from_secs(2 * 60)).await;

    let (expired_status, _, expired_body) = app
        .get(&format!("/api/secret/{}", created["id"].as_str().unwrap()))
        .await;
    let (unknown_status, _, unknown_body) = app
        .get("/api/secret/0123456789abcdefghijABCDEFGHIJ01")
        .await;

    assert_eq!(expired_status, StatusCode::NOT_FOUND);
    assert_eq!(expired_status, unknown_status);
    assert_eq!(expired_body, unknown_body);
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();

    let (status, _, body) = app.get("/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["message"].is_string());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_version() {
    let app = TestApp::new();

    let (status, _, body) = app.get("/_status/version").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_fallback_not_found() {
    let app = TestApp::new();

    let request = Request::builder()
        .method(Method::PUT)
        .uri("/api/nothing-here")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = app.send(request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Endpoint not found");
    assert_eq!(body["path"], "/api/nothing-here");
    assert_eq!(body["method"], "PUT");
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = TestApp::new();

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/secret")
        .header(header::ORIGIN, "https://example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert!(response.status().is_success());
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn test_sealed_message_round_trip() {
    let app = TestApp::new();
    let recipient = SecretKey::generate().unwrap();
    let envelope = Envelope::seal(&recipient.public(), "the vault code is 4-8-15-16").unwrap();

    let (status, created) = app
        .create(json!({ "envelope": envelope, "ttlMinutes": 60 }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, body) = app
        .get(&format!("/api/secret/{}", created["id"].as_str().unwrap()))
        .await;
    assert_eq!(status, StatusCode::OK);

    let fetched: Envelope = serde_json::from_value(body).unwrap();
    assert_eq!(fetched, envelope);
    assert_eq!(
        fetched.open_to_string(&recipient).unwrap(),
        "the vault code is 4-8-15-16"
    );
}
