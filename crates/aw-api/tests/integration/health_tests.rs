//! Info, health, metrics and API docs endpoints.

use axum::http::{header, HeaderName, StatusCode};

use super::common::{get, TestApp};

#[tokio::test]
async fn test_api_info() {
    let app = TestApp::spawn().await;

    let response = app.send(get("/api", None)).await;
    assert_eq!(response.status, StatusCode::OK);

    let body = response.json();
    assert_eq!(body["message"], "Aware Material Tracking Platform API");
    assert_eq!(body["status"], "running");
    assert_eq!(body["features"]["ledger"], true);
    assert_eq!(body["features"]["textGeneration"], false);
    assert_eq!(body["ledger"]["backend"], "memory");
}

#[tokio::test]
async fn test_health_reports_ledger_state() {
    let app = TestApp::spawn().await;

    let healthy = app.send(get("/health", None)).await;
    assert_eq!(healthy.status, StatusCode::OK);
    assert_eq!(healthy.json()["status"], "healthy");
    assert_eq!(healthy.json()["ledger"]["ready"], true);

    app.ledger.set_ready(false);
    let degraded = app.send(get("/health", None)).await;
    assert_eq!(degraded.status, StatusCode::OK);
    assert_eq!(degraded.json()["status"], "degraded");
}

#[tokio::test]
async fn test_liveness() {
    let app = TestApp::spawn().await;

    let response = app.send(get("/live", None)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["status"], "alive");
}

#[tokio::test]
async fn test_metrics_without_recorder() {
    let app = TestApp::spawn().await;

    let response = app.send(get("/metrics", None)).await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_openapi_document() {
    let app = TestApp::spawn().await;

    let response = app.send(get("/api-docs/openapi.json", None)).await;
    assert_eq!(response.status, StatusCode::OK);

    let doc = response.json();
    assert_eq!(doc["info"]["title"], "Aware API");
    assert!(doc["paths"]["/api/auth/login"].is_object());
    assert!(doc["paths"]["/api/predict"].is_object());
}

#[tokio::test]
async fn test_responses_carry_request_id_and_security_headers() {
    let app = TestApp::spawn().await;

    let response = app.send(get("/api/batches", None)).await;
    assert!(response.header(HeaderName::from_static("x-request-id")).is_some());
    assert_eq!(
        response.header(header::X_CONTENT_TYPE_OPTIONS),
        Some("nosniff")
    );
}
