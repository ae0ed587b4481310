//! Batch lifecycle tests over the seeded ledger.

use axum::http::{Method, StatusCode};
use serde_json::json;

use super::common::{get, json_request, new_batch, post, TestApp};

async fn create(app: &TestApp, cookie: &str, asset_id: &str, material: &str, weight: &str) -> u64 {
    let response = app
        .send(post(
            "/api/batches/create",
            new_batch(asset_id, material, weight),
            Some(cookie),
        ))
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.text());
    let body = response.json();
    assert_eq!(body["success"], true);
    assert!(body["transactionHash"].as_str().unwrap().starts_with("0x"));
    body["batchId"].as_u64().unwrap()
}

// ============================================================
// Creation and reads
// ============================================================

#[tokio::test]
async fn test_create_batch_is_pending() {
    let app = TestApp::spawn().await;
    let producer = app.login_demo("producer1").await;

    let id = create(&app, &producer, "LINEN-2024-010", "Belgian Flax Linen", "120 kg").await;
    assert_eq!(id, 4);

    let body = app.send(get(&format!("/api/batches/{}", id), None)).await.json();
    let batch = &body["batch"];
    assert_eq!(batch["status"], 0);
    assert_eq!(batch["createdByName"], "producer1");
    assert_eq!(batch["physicalAsset"]["assetId"], "LINEN-2024-010");
    assert_eq!(batch["tracer"]["country"], "Portugal");
}

#[tokio::test]
async fn test_create_batch_requires_asset_fields() {
    let app = TestApp::spawn().await;
    let producer = app.login_demo("producer1").await;

    let response = app
        .send(post(
            "/api/batches/create",
            json!({ "physicalAsset": { "material": "Cotton" } }),
            Some(&producer),
        ))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.json()["message"]
        .as_str()
        .unwrap()
        .contains("assetId"));
}

#[tokio::test]
async fn test_create_batch_with_wrong_field_type() {
    let app = TestApp::spawn().await;
    let producer = app.login_demo("producer1").await;

    let response = app
        .send(post(
            "/api/batches/create",
            json!({ "physicalAsset": { "assetId": 42, "material": "Cotton" } }),
            Some(&producer),
        ))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = response.json();
    assert_eq!(body["code"], "BAD_REQUEST");
    assert!(body["message"].as_str().unwrap().contains("assetId"));
}

#[tokio::test]
async fn test_get_missing_batch() {
    let app = TestApp::spawn().await;

    let response = app.send(get("/api/batches/404", None)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json()["message"], "Batch not found");
}

#[tokio::test]
async fn test_list_filters_and_sorts() {
    let app = TestApp::spawn().await;

    let all = app.send(get("/api/batches", None)).await.json();
    assert_eq!(all["count"], 3);
    assert_eq!(all["batches"][0]["id"], 1, "ledger order by default");

    let by_asset = app.send(get("/api/batches?sort=assetId", None)).await.json();
    assert_eq!(by_asset["batches"][0]["physicalAsset"]["assetId"], "COTTON-2024-001");
    assert_eq!(by_asset["batches"][2]["physicalAsset"]["assetId"], "WOOL-2024-002");

    let pending = app.send(get("/api/batches?status=0", None)).await.json();
    assert_eq!(pending["count"], 3);

    let approved = app
        .send(get("/api/batches?status=Approved", None))
        .await
        .json();
    assert_eq!(approved["count"], 0);

    let everything = app.send(get("/api/batches?status=all", None)).await.json();
    assert_eq!(everything["count"], 3);

    let silk = app.send(get("/api/batches?search=SILK", None)).await.json();
    assert_eq!(silk["count"], 1);
    assert_eq!(silk["batches"][0]["physicalAsset"]["assetId"], "SILK-2024-003");

    let bad = app.send(get("/api/batches?status=shipped", None)).await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
}

// ============================================================
// Review
// ============================================================

#[tokio::test]
async fn test_producer_cannot_review() {
    let app = TestApp::spawn().await;
    let producer = app.login_demo("producer1").await;

    let response = app
        .send(post("/api/batches/1/approve", json!({}), Some(&producer)))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.json()["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_creator_cannot_review_own_batch() {
    let app = TestApp::spawn().await;
    let manufacturer = app.login_demo("manufacturer1").await;

    let id = create(&app, &manufacturer, "WOOL-2024-020", "Lambswool", "80").await;
    let response = app
        .send(post(
            &format!("/api/batches/{}/approve", id),
            json!({}),
            Some(&manufacturer),
        ))
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_approval_credits_creator_wallet() {
    let app = TestApp::spawn().await;
    let admin = app.login_demo("admin1").await;

    let response = app
        .send(post("/api/batches/1/approve", json!({}), Some(&admin)))
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.text());
    assert_eq!(response.json()["success"], true);

    let batch = app.send(get("/api/batches/1", None)).await.json();
    assert_eq!(batch["batch"]["status"], 1);
    assert_eq!(batch["batch"]["approvedByName"], "admin1");

    let producer = app.login_demo("producer1").await;
    let wallet = app
        .send(get("/api/wallet/balance", Some(&producer)))
        .await
        .json();
    assert_eq!(wallet["username"], "producer1");
    assert_eq!(wallet["balances"]["Cotton"].as_f64(), Some(500.0));
    assert_eq!(wallet["total"].as_f64(), Some(500.0));

    let twice = app
        .send(post("/api/batches/1/approve", json!({}), Some(&admin)))
        .await;
    assert_eq!(twice.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_reject_without_reason() {
    let app = TestApp::spawn().await;
    let distributor = app.login_demo("distributor1").await;

    let response = app
        .send(json_request(
            Method::POST,
            "/api/batches/2/reject",
            None,
            Some(&distributor),
        ))
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.text());

    let batch = app.send(get("/api/batches/2", None)).await.json();
    assert_eq!(batch["batch"]["status"], 2);
    assert_eq!(batch["batch"]["rejectionReason"], "No reason provided");
    assert_eq!(batch["batch"]["approvedByName"], "distributor1");

    let producer = app.login_demo("producer1").await;
    let wallet = app
        .send(get("/api/wallet/balance", Some(&producer)))
        .await
        .json();
    assert!(wallet["balances"].get("Wool").is_none());
}

#[tokio::test]
async fn test_reject_with_reason() {
    let app = TestApp::spawn().await;
    let manufacturer = app.login_demo("manufacturer1").await;

    let response = app
        .send(post(
            "/api/batches/3/reject",
            json!({ "reason": "Moisture above threshold" }),
            Some(&manufacturer),
        ))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let batch = app.send(get("/api/batches/3", None)).await.json();
    assert_eq!(batch["batch"]["rejectionReason"], "Moisture above threshold");
}

// ============================================================
// Certification
// ============================================================

#[tokio::test]
async fn test_certification_flow() {
    let app = TestApp::spawn().await;
    let certifier = app.login_demo("certifier1").await;

    let pending = app
        .send(post("/api/batches/1/certify", json!({}), Some(&certifier)))
        .await;
    assert_eq!(pending.status, StatusCode::CONFLICT);

    let admin = app.login_demo("admin1").await;
    let approved = app
        .send(post("/api/batches/1/approve", json!({}), Some(&admin)))
        .await;
    assert_eq!(approved.status, StatusCode::OK);

    let producer = app.login_demo("producer1").await;
    let by_producer = app
        .send(post("/api/batches/1/certify", json!({}), Some(&producer)))
        .await;
    assert_eq!(by_producer.status, StatusCode::FORBIDDEN);

    let response = app
        .send(post(
            "/api/batches/1/certify",
            json!({ "certificationHash": "QmOrganicCert2024" }),
            Some(&certifier),
        ))
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.text());

    let batch = app.send(get("/api/batches/1", None)).await.json();
    assert_eq!(batch["batch"]["status"], 3);
    assert_eq!(batch["batch"]["certifiedByName"], "certifier1");
    assert_eq!(batch["batch"]["certificationHash"], "QmOrganicCert2024");
}

#[tokio::test]
async fn test_lifecycle_on_missing_batch() {
    let app = TestApp::spawn().await;
    let admin = app.login_demo("admin1").await;

    let response = app
        .send(post("/api/batches/77/approve", json!({}), Some(&admin)))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

// ============================================================
// Wallet access
// ============================================================

#[tokio::test]
async fn test_wallet_visibility() {
    let app = TestApp::spawn().await;
    let producer = app.login_demo("producer1").await;
    let admin = app.login_demo("admin1").await;

    let own = app
        .send(get("/api/wallets/producer1/balance", Some(&producer)))
        .await;
    assert_eq!(own.status, StatusCode::OK);

    let other = app
        .send(get("/api/wallets/admin1/balance", Some(&producer)))
        .await;
    assert_eq!(other.status, StatusCode::FORBIDDEN);

    let as_admin = app
        .send(get("/api/wallets/producer1/balance", Some(&admin)))
        .await;
    assert_eq!(as_admin.status, StatusCode::OK);

    let missing = app
        .send(get("/api/wallets/ghost/balance", Some(&admin)))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}
