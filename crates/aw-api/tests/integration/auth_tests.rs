//! Authentication and session tests.

use axum::http::{Method, StatusCode};
use serde_json::json;

use aw_core::{BatchLedger, Role};

use super::common::{get, json_request, post, session_cookie, TestApp};

// ============================================================
// Protected endpoints
// ============================================================

#[tokio::test]
async fn test_writes_require_login() {
    let app = TestApp::spawn().await;

    let requests = vec![
        post("/api/batches/create", json!({}), None),
        post("/api/batches/1/approve", json!({}), None),
        post("/api/batches/1/reject", json!({}), None),
        post("/api/batches/1/certify", json!({}), None),
        post("/api/submissions", json!({}), None),
        json_request(Method::DELETE, "/api/submissions/SUB-1", None, None),
        get("/api/wallet/balance", None),
        get("/api/wallets/producer1/balance", None),
    ];

    for request in requests {
        let uri = request.uri().to_string();
        let response = app.send(request).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{}", uri);

        let body = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "UNAUTHORIZED");
        assert_eq!(body["message"], "Not logged in");
    }
}

#[tokio::test]
async fn test_reads_are_open() {
    let app = TestApp::spawn().await;

    assert_eq!(app.send(get("/api/batches", None)).await.status, StatusCode::OK);
    assert_eq!(app.send(get("/api/batches/1", None)).await.status, StatusCode::OK);
    assert_eq!(
        app.send(get("/api/submissions", None)).await.status,
        StatusCode::OK
    );
}

// ============================================================
// Login / session / logout
// ============================================================

#[tokio::test]
async fn test_session_without_cookie() {
    let app = TestApp::spawn().await;

    let response = app.send(get("/api/auth/session", None)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({ "loggedIn": false }));
}

#[tokio::test]
async fn test_login_session_logout_round_trip() {
    let app = TestApp::spawn().await;

    let login = app
        .send(post(
            "/api/auth/login",
            json!({ "username": "certifier1", "password": "test123" }),
            None,
        ))
        .await;
    assert_eq!(login.status, StatusCode::OK);
    let body = login.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["username"], "certifier1");
    assert_eq!(body["user"]["role"], 3);
    assert_eq!(body["user"]["roleName"], "Certifier");
    assert!(body["user"]["address"].as_str().unwrap().starts_with("0x"));

    let cookie = session_cookie(&login).expect("session cookie");
    assert!(cookie.starts_with("aware_session="));

    let session = app.send(get("/api/auth/session", Some(&cookie))).await.json();
    assert_eq!(session["loggedIn"], true);
    assert_eq!(session["user"]["username"], "certifier1");

    let logout = app
        .send(post("/api/auth/logout", json!({}), Some(&cookie)))
        .await;
    assert_eq!(logout.status, StatusCode::OK);
    assert_eq!(logout.json()["success"], true);

    let session = app.send(get("/api/auth/session", Some(&cookie))).await.json();
    assert_eq!(session["loggedIn"], false);

    let balance = app.send(get("/api/wallet/balance", Some(&cookie))).await;
    assert_eq!(balance.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let app = TestApp::spawn().await;

    let wrong_password = app
        .send(post(
            "/api/auth/login",
            json!({ "username": "producer1", "password": "nope123" }),
            None,
        ))
        .await;
    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.json()["code"], "INVALID_CREDENTIALS");

    let unknown_user = app
        .send(post(
            "/api/auth/login",
            json!({ "username": "ghost", "password": "test123" }),
            None,
        ))
        .await;
    assert_eq!(unknown_user.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_requires_both_fields() {
    let app = TestApp::spawn().await;

    let response = app
        .send(post("/api/auth/login", json!({ "username": "producer1" }), None))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json()["message"],
        "Username and password are required"
    );
}

#[tokio::test]
async fn test_login_with_malformed_body() {
    let app = TestApp::spawn().await;

    let response = app
        .send(post(
            "/api/auth/login",
            json!({ "username": ["producer1"], "password": "test123" }),
            None,
        ))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_login_when_ledger_not_ready() {
    let app = TestApp::spawn().await;
    app.ledger.set_ready(false);

    let response = app
        .send(post(
            "/api/auth/login",
            json!({ "username": "producer1", "password": "test123" }),
            None,
        ))
        .await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.json()["message"], "Blockchain not ready");
}

// ============================================================
// Registration
// ============================================================

#[tokio::test]
async fn test_register_then_login() {
    let app = TestApp::spawn().await;

    let response = app
        .send(post(
            "/api/auth/register",
            json!({ "username": "weaver7", "password": "loom-secret", "role": 1 }),
            None,
        ))
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.text());
    let body = response.json();
    assert_eq!(body["success"], true);
    let address = body["address"].as_str().unwrap().to_string();

    let cookie = app.login("weaver7", "loom-secret").await;
    let session = app.send(get("/api/auth/session", Some(&cookie))).await.json();
    assert_eq!(session["user"]["roleName"], "Manufacturer");
    assert_eq!(session["user"]["address"], address.as_str());
}

#[tokio::test]
async fn test_session_carries_ledger_account_address() {
    let app = TestApp::spawn().await;
    let ledger_address = "0x00000000000000000000000000000000000000aa";
    app.ledger
        .register_user("dyer3", "vat-secret", Role::Manufacturer, ledger_address)
        .await
        .unwrap();

    let cookie = app.login("dyer3", "vat-secret").await;
    let session = app.send(get("/api/auth/session", Some(&cookie))).await.json();
    assert_eq!(session["user"]["address"], ledger_address);

    let wallet = app.state.wallets.get("dyer3").await.unwrap();
    assert_ne!(wallet.address, ledger_address);
}

#[tokio::test]
async fn test_register_accepts_role_label() {
    let app = TestApp::spawn().await;

    let response = app
        .send(post(
            "/api/auth/register",
            json!({ "username": "mover2", "password": "truck-123", "role": "Distributor" }),
            None,
        ))
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_register_rejections() {
    let app = TestApp::spawn().await;

    let duplicate = app
        .send(post(
            "/api/auth/register",
            json!({ "username": "producer1", "password": "test123", "role": 0 }),
            None,
        ))
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
    assert_eq!(duplicate.json()["message"], "Username already exists");

    let weak = app
        .send(post(
            "/api/auth/register",
            json!({ "username": "shorty", "password": "abc", "role": 0 }),
            None,
        ))
        .await;
    assert_eq!(weak.status, StatusCode::BAD_REQUEST);

    let bad_role = app
        .send(post(
            "/api/auth/register",
            json!({ "username": "nobody", "password": "test123", "role": 9 }),
            None,
        ))
        .await;
    assert_eq!(bad_role.status, StatusCode::BAD_REQUEST);

    let missing = app
        .send(post("/api/auth/register", json!({ "password": "test123", "role": 0 }), None))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
}
