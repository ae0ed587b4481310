//! Common test utilities for integration tests.

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use aw_api::{ApiServer, ApiServerConfig, AppState};
use aw_core::{seed_demo_data, InMemoryLedger, SpreadsheetStorage, WalletRegistry};

/// Password of every seeded demo account.
pub const DEMO_PASSWORD: &str = "test123";

/// A running router over seeded in-memory state.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub ledger: Arc<InMemoryLedger>,
    _dir: TempDir,
}

/// A decoded response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or_else(|e| {
            panic!(
                "Failed to parse response: {} - Body: {:?}",
                e,
                String::from_utf8_lossy(&self.body)
            )
        })
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl TestApp {
    /// Builds the app with demo accounts and sample batches.
    pub async fn spawn() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let storage = SpreadsheetStorage::new(dir.path().join("data").join("submissions.xlsx"))
            .expect("Failed to open spreadsheet storage");
        let ledger = Arc::new(InMemoryLedger::new());
        let wallets = WalletRegistry::new();

        seed_demo_data(ledger.as_ref(), &wallets)
            .await
            .expect("Failed to seed demo data");

        let state = AppState::new(ledger.clone(), wallets, Arc::new(storage));
        let router = ApiServer::new(state.clone(), ApiServerConfig::default()).router();

        Self {
            router,
            state,
            ledger,
            _dir: dir,
        }
    }

    /// Sends a request through a fresh clone of the router.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Logs in and returns the `name=value` session cookie.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .send(json_request(
                Method::POST,
                "/api/auth/login",
                Some(serde_json::json!({ "username": username, "password": password })),
                None,
            ))
            .await;
        assert_eq!(
            response.status,
            StatusCode::OK,
            "login failed: {}",
            response.text()
        );
        session_cookie(&response).expect("login did not set a session cookie")
    }

    /// Logs in a seeded demo account.
    pub async fn login_demo(&self, username: &str) -> String {
        self.login(username, DEMO_PASSWORD).await
    }
}

/// Extracts the `name=value` part of the `Set-Cookie` header.
pub fn session_cookie(response: &TestResponse) -> Option<String> {
    response
        .header(header::SET_COOKIE)
        .and_then(|c| c.split(';').next())
        .map(str::to_string)
}

/// Builds a request with an optional JSON body and session cookie.
pub fn json_request(
    method: Method,
    uri: &str,
    body: Option<Value>,
    cookie: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    json_request(Method::GET, uri, None, cookie)
}

pub fn post(uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
    json_request(Method::POST, uri, Some(body), cookie)
}

/// A minimal batch payload.
pub fn new_batch(asset_id: &str, material: &str, weight: &str) -> Value {
    serde_json::json!({
        "physicalAsset": {
            "assetId": asset_id,
            "material": material,
            "weight": weight,
            "batchNumber": format!("{}-LOT", asset_id),
        },
        "tracer": { "supplier": "Test Supplier", "country": "Portugal" },
        "validation": { "qualityGrade": "A" },
        "compliance": { "regulatoryStandards": "REACH" }
    })
}

/// A submission that passes every form rule.
pub fn valid_submission() -> Value {
    serde_json::json!({
        "date": "2024-05-01",
        "productionFacility": "Porto Spinning Mill",
        "valueChainProcessMain": "Spinning",
        "valueChainProcessSub": "Ring Spinning",
        "awareTokenType": "Cotton",
        "materialSpecification": "Yarn Ne 30/1",
        "mainColorSelected": "Natural",
        "productionLotBatchNo": "LOT-7781",
        "totalWeightKgs": 1200,
        "sustainableProcessClaims": true,
        "wetProcessing": false,
        "materials": [
            {
                "compositionMaterial": "Cotton",
                "percentage": 80,
                "sustainable": true,
                "sustainabilityClaim": "Organic"
            },
            {
                "compositionMaterial": "Polyester",
                "percentage": 20,
                "sustainable": true,
                "sustainabilityClaim": "Recycled",
                "feedstockRecycledMaterials": "PostConsumer"
            }
        ],
        "tracerAdded": true,
        "typeOfTracer": "Aware",
        "awareTracerPositiveScanDate": "2024-04-28",
        "validationMethod": "SelfValidation",
        "selfValidation": {
            "sources": [
                { "kgs": 960, "sourceName": "Green Fields Farm", "feedstockType": "Organic" },
                { "kgs": 240, "sourceName": "Loop Recycling", "feedstockType": "PostConsumer" }
            ],
            "totalSourceInput": 1200
        }
    })
}
