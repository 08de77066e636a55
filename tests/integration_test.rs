//! Integration tests for the QR tracking API
//!
//! These tests drive the full router against a temporary database:
//! - HTTP routing
//! - Request/response handling
//! - Ledger operations
//! - Error handling

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use hyper::header::LOCATION;
use serde_json::{json, Value};
use tempfile::NamedTempFile;
use tower::ServiceExt;

use qrtrack::database::{init_db, AppState};
use qrtrack::route::create_app;

/// Helper function to create a test application with a temporary database
fn setup_test_app() -> (Router, NamedTempFile) {
    let temp_db = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = temp_db.path().to_str().unwrap();

    let db = init_db(db_path).expect("Failed to initialize test database");
    let app = create_app(AppState::new(db));

    (app, temp_db)
}

/// Helper function to parse response body as JSON
async fn response_json(body: Body) -> Value {
    let bytes = body
        .collect()
        .await
        .expect("Failed to read response body")
        .to_bytes();

    serde_json::from_slice(&bytes).expect("Failed to parse JSON")
}

async fn response_text(body: Body) -> String {
    let bytes = body
        .collect()
        .await
        .expect("Failed to read response body")
        .to_bytes();

    String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8")
}

async fn send(app: &Router, method: &str, uri: &str) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("host", "qr.test")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn create_qr(app: &Router, payload: Value) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/create-qr")
                .header("host", "qr.test")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

/// Creates a code and returns its short code
async fn create_code(app: &Router, url: &str) -> String {
    let response = create_qr(app, json!({ "url": url })).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response.into_body()).await;
    body["shortCode"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_create_qr_success() {
    let (app, _temp_db) = setup_test_app();

    let response = create_qr(&app, json!({ "url": "https://example.com" })).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response.into_body()).await;
    let code = body["shortCode"].as_str().unwrap();

    assert_eq!(body["success"], true);
    assert_eq!(code.len(), 8);
    assert!(code.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
    assert_eq!(body["originalUrl"], "https://example.com");
    assert_eq!(body["redirectUrl"], format!("http://qr.test/r/{}", code));
    assert_eq!(body["trackingUrl"], format!("http://qr.test/api/stats/{}", code));

    // "http://qr.test/r/" plus 8 characters is 25 bytes, version 2 at level M
    assert_eq!(body["symbol"]["version"], 2);
    assert_eq!(body["symbol"]["modules"], 25);
    assert_eq!(body["symbol"]["level"], "M");
    assert_eq!(body["symbol"]["mode"], "byte");
    assert_eq!(body["symbol"]["svgFilename"], format!("qrcode_tracked_{}.svg", code));
}

#[tokio::test]
async fn test_create_qr_missing_url() {
    let (app, _temp_db) = setup_test_app();

    let response = create_qr(&app, json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response_json(response.into_body()).await;
    assert_eq!(body["error"], "URL is required");
}

#[tokio::test]
async fn test_create_qr_empty_url_persists_nothing() {
    let (app, _temp_db) = setup_test_app();

    let response = create_qr(&app, json!({ "url": "" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = create_qr(&app, json!({ "url": "   " })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, "GET", "/api/all-qr-codes").await;
    let body = response_json(response.into_body()).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_create_qr_unredirectable_url() {
    let (app, _temp_db) = setup_test_app();

    let response = create_qr(&app, json!({ "url": "https://example.com/a\nb" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response_json(response.into_body()).await;
    assert_eq!(body["code"], "validation");

    let response = send(&app, "GET", "/api/all-qr-codes").await;
    let body = response_json(response.into_body()).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_create_qr_malformed_body() {
    let (app, _temp_db) = setup_test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/create-qr")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_qr_symbol_too_small() {
    let (app, _temp_db) = setup_test_app();

    // Version 1 at level H holds 7 bytes, far less than the redirect URL
    let response = create_qr(
        &app,
        json!({ "url": "https://example.com", "level": "H", "version": 1 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let body = response_json(response.into_body()).await;
    assert_eq!(body["code"], "capacity_exceeded");

    let response = send(&app, "GET", "/api/all-qr-codes").await;
    let body = response_json(response.into_body()).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_create_qr_invalid_version() {
    let (app, _temp_db) = setup_test_app();

    let response = create_qr(&app, json!({ "url": "https://example.com", "version": 41 })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_qr_forwarded_proto() {
    let (app, _temp_db) = setup_test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/create-qr")
                .header("host", "qr.test")
                .header("x-forwarded-proto", "https")
                .header("content-type", "application/json")
                .body(Body::from(json!({ "url": "https://example.com" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let body = response_json(response.into_body()).await;
    let code = body["shortCode"].as_str().unwrap();
    assert_eq!(body["redirectUrl"], format!("https://qr.test/r/{}", code));
}

#[tokio::test]
async fn test_create_qr_public_url() {
    let temp_db = NamedTempFile::new().unwrap();
    let db = init_db(temp_db.path().to_str().unwrap()).unwrap();
    let mut state = AppState::new(db);
    state.public_url = Some("https://qr.example.org".to_string());
    let app = create_app(state);

    let response = create_qr(&app, json!({ "url": "https://example.com" })).await;
    let body = response_json(response.into_body()).await;
    let code = body["shortCode"].as_str().unwrap();
    assert_eq!(body["redirectUrl"], format!("https://qr.example.org/r/{}", code));
}

#[tokio::test]
async fn test_redirect_counts_scan() {
    let (app, _temp_db) = setup_test_app();
    let code = create_code(&app, "https://example.com/landing").await;

    let response = send(&app, "GET", &format!("/r/{}", code)).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get(LOCATION).unwrap(),
        "https://example.com/landing"
    );

    let response = send(&app, "GET", &format!("/api/stats/{}", code)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response.into_body()).await;
    assert_eq!(body["shortCode"], code);
    assert_eq!(body["originalUrl"], "https://example.com/landing");
    assert_eq!(body["scanCount"], 1);
    assert!(body["lastScanned"].is_string());
}

#[tokio::test]
async fn test_redirect_not_found() {
    let (app, _temp_db) = setup_test_app();

    let response = send(&app, "GET", "/r/deadbeef").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response_text(response.into_body()).await, "QR code not found");
}

#[tokio::test]
async fn test_stats_never_scanned() {
    let (app, _temp_db) = setup_test_app();
    let code = create_code(&app, "https://example.com").await;

    let response = send(&app, "GET", &format!("/api/stats/{}", code)).await;
    let body = response_json(response.into_body()).await;

    assert_eq!(body["scanCount"], 0);
    assert!(body["lastScanned"].is_null());
    assert!(body["createdAt"].is_string());
}

#[tokio::test]
async fn test_stats_not_found() {
    let (app, _temp_db) = setup_test_app();

    let response = send(&app, "GET", "/api/stats/deadbeef").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = response_json(response.into_body()).await;
    assert_eq!(body["error"], "QR code not found");
}

#[tokio::test]
async fn test_list_newest_first() {
    let (app, _temp_db) = setup_test_app();

    let first = create_code(&app, "https://example.com/a").await;
    let second = create_code(&app, "https://example.com/b").await;

    let response = send(&app, "GET", "/api/all-qr-codes").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response.into_body()).await;
    let records = body.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["short_code"], second);
    assert_eq!(records[0]["original_url"], "https://example.com/b");
    assert_eq!(records[0]["scan_count"], 0);
    assert!(records[0]["last_scanned"].is_null());
    assert_eq!(records[1]["short_code"], first);
}

#[tokio::test]
async fn test_list_empty() {
    let (app, _temp_db) = setup_test_app();

    let response = send(&app, "GET", "/api/all-qr-codes").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response.into_body()).await, json!([]));
}

#[tokio::test]
async fn test_delete_then_gone() {
    let (app, _temp_db) = setup_test_app();
    let code = create_code(&app, "https://example.com/delete-me").await;

    let response = send(&app, "DELETE", &format!("/api/delete-qr/{}", code)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response.into_body()).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "QR code deleted");

    let response = send(&app, "GET", &format!("/r/{}", code)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, "GET", &format!("/api/stats/{}", code)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, "DELETE", &format!("/api/delete-qr/{}", code)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, "GET", "/api/all-qr-codes").await;
    assert_eq!(response_json(response.into_body()).await, json!([]));
}

#[tokio::test]
async fn test_delete_not_found() {
    let (app, _temp_db) = setup_test_app();

    let response = send(&app, "DELETE", "/api/delete-qr/deadbeef").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_capacity_lookup() {
    let (app, _temp_db) = setup_test_app();

    let response = send(&app, "GET", "/api/capacity?length=18&level=L&mode=byte").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response.into_body()).await;
    assert_eq!(body["version"], 2);
    assert_eq!(body["capacity"], 32);
    assert_eq!(body["modules"], 25);

    let response = send(&app, "GET", "/api/capacity?length=0").await;
    let body = response_json(response.into_body()).await;
    assert_eq!(body["version"], 1);
    assert_eq!(body["level"], "M");
    assert_eq!(body["mode"], "byte");
}

#[tokio::test]
async fn test_capacity_lookup_errors() {
    let (app, _temp_db) = setup_test_app();

    let response = send(&app, "GET", "/api/capacity?length=3000&level=L&mode=byte").await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let response = send(&app, "GET", "/api/capacity?length=10&mode=octal").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response.into_body()).await;
    assert_eq!(body["code"], "validation");
    assert!(body["error"].is_string());

    let response = send(&app, "GET", "/api/capacity?level=Q").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response.into_body()).await;
    assert_eq!(body["code"], "validation");
}

#[tokio::test]
async fn test_capacity_table() {
    let (app, _temp_db) = setup_test_app();

    let response = send(&app, "GET", "/api/capacity-table").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response.into_body()).await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 40);
    assert_eq!(rows[0]["version"], 1);
    assert_eq!(rows[0]["L"]["numeric"], 41);
    assert_eq!(rows[39]["H"]["kanji"], 784);
}
