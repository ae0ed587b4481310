//! Spreadsheet-backed submission tests.

use axum::http::{header, Method, StatusCode};
use serde_json::json;

use super::common::{get, json_request, post, valid_submission, TestApp};

// ============================================================
// Validation
// ============================================================

#[tokio::test]
async fn test_create_requires_login() {
    let app = TestApp::spawn().await;

    let response = app
        .send(post("/api/submissions", valid_submission(), None))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let list = app.send(get("/api/submissions", None)).await.json();
    assert_eq!(list["count"], 0);
}

#[tokio::test]
async fn test_invalid_submission_lists_errors() {
    let app = TestApp::spawn().await;
    let cookie = app.login_demo("manufacturer1").await;

    let mut submission = valid_submission();
    submission["productionFacility"] = json!("");
    submission["materials"][0]["percentage"] = json!(140);

    let response = app
        .send(post("/api/submissions", submission, Some(&cookie)))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let body = response.json();
    assert_eq!(body["code"], "VALIDATION_ERROR");
    let errors = body["details"]["errors"].as_array().unwrap();
    assert!(errors.len() >= 2, "{:?}", errors);
    assert!(errors
        .iter()
        .any(|e| e.as_str().unwrap().contains("Production Facility")));
}

#[tokio::test]
async fn test_empty_submission_is_rejected() {
    let app = TestApp::spawn().await;
    let cookie = app.login_demo("manufacturer1").await;

    let response = app
        .send(post("/api/submissions", json!({}), Some(&cookie)))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_fields_get_json_error_bodies() {
    let app = TestApp::spawn().await;
    let cookie = app.login_demo("manufacturer1").await;

    let mut wrong_type = valid_submission();
    wrong_type["productionFacility"] = json!(12);
    let response = app
        .send(post("/api/submissions", wrong_type, Some(&cookie)))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "BAD_REQUEST");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("productionFacility"));

    let mut unknown_variant = valid_submission();
    unknown_variant["validationMethod"] = json!("NotAMethod");
    let response = app
        .send(post("/api/submissions", unknown_variant, Some(&cookie)))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = response.json();
    assert_eq!(body["code"], "BAD_REQUEST");
    assert!(body["message"].as_str().unwrap().contains("NotAMethod"));

    let search = app
        .send(post("/api/submissions/search", json!([1, 2]), None))
        .await;
    assert_eq!(search.status, StatusCode::BAD_REQUEST);
    assert_eq!(search.json()["success"], false);
}

// ============================================================
// Create / read / search / update / delete
// ============================================================

#[tokio::test]
async fn test_submission_round_trip() {
    let app = TestApp::spawn().await;
    let cookie = app.login_demo("manufacturer1").await;

    let created = app
        .send(post("/api/submissions", valid_submission(), Some(&cookie)))
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.text());
    let id = created.json()["id"].as_str().unwrap().to_string();
    assert!(id.starts_with("SUB-"));

    let fetched = app
        .send(get(&format!("/api/submissions/{}", id), None))
        .await;
    assert_eq!(fetched.status, StatusCode::OK);
    let record = fetched.json();
    assert_eq!(record["data"]["Submission ID"], id.as_str());
    assert_eq!(record["data"]["Production Facility"], "Porto Spinning Mill");

    let found = app
        .send(post(
            "/api/submissions/search",
            json!({ "Production Facility": "Porto Spinning Mill", "Date": null }),
            None,
        ))
        .await
        .json();
    assert_eq!(found["count"], 1);

    let by_number = app
        .send(post(
            "/api/submissions/search",
            json!({ "Total Weight (Kgs)": 1200 }),
            None,
        ))
        .await
        .json();
    assert_eq!(by_number["count"], 1);
    assert_eq!(by_number["data"][0]["Total Weight (Kgs)"], 1200);

    let by_text = app
        .send(post(
            "/api/submissions/search",
            json!({ "Total Weight (Kgs)": "1200" }),
            None,
        ))
        .await
        .json();
    assert_eq!(by_text["count"], 0);

    let none = app
        .send(post(
            "/api/submissions/search",
            json!({ "Production Facility": "Braga Weaving" }),
            None,
        ))
        .await
        .json();
    assert_eq!(none["count"], 0);

    let mut changed = valid_submission();
    changed["productionFacility"] = json!("Braga Weaving");
    let updated = app
        .send(json_request(
            Method::PUT,
            &format!("/api/submissions/{}", id),
            Some(changed),
            Some(&cookie),
        ))
        .await;
    assert_eq!(updated.status, StatusCode::OK, "{}", updated.text());

    let record = app
        .send(get(&format!("/api/submissions/{}", id), None))
        .await
        .json();
    assert_eq!(record["data"]["Production Facility"], "Braga Weaving");

    let list = app.send(get("/api/submissions", None)).await.json();
    assert_eq!(list["count"], 1);

    let deleted = app
        .send(json_request(
            Method::DELETE,
            &format!("/api/submissions/{}", id),
            None,
            Some(&cookie),
        ))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);

    let gone = app
        .send(get(&format!("/api/submissions/{}", id), None))
        .await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    assert_eq!(gone.json()["message"], "Submission not found");
}

#[tokio::test]
async fn test_update_and_delete_missing_submission() {
    let app = TestApp::spawn().await;
    let cookie = app.login_demo("manufacturer1").await;

    let updated = app
        .send(json_request(
            Method::PUT,
            "/api/submissions/SUB-00000000000000-AAAAAA",
            Some(valid_submission()),
            Some(&cookie),
        ))
        .await;
    assert_eq!(updated.status, StatusCode::NOT_FOUND);

    let deleted = app
        .send(json_request(
            Method::DELETE,
            "/api/submissions/SUB-00000000000000-AAAAAA",
            None,
            Some(&cookie),
        ))
        .await;
    assert_eq!(deleted.status, StatusCode::NOT_FOUND);
}

// ============================================================
// Exports
// ============================================================

#[tokio::test]
async fn test_csv_export() {
    let app = TestApp::spawn().await;
    let cookie = app.login_demo("manufacturer1").await;
    app.send(post("/api/submissions", valid_submission(), Some(&cookie)))
        .await;

    let response = app.send(get("/api/export/csv", None)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response
        .header(header::CONTENT_TYPE)
        .unwrap()
        .starts_with("text/csv"));
    assert!(response
        .header(header::CONTENT_DISPOSITION)
        .unwrap()
        .contains("attachment"));

    let text = response.text();
    let mut lines = text.lines();
    assert!(lines.next().unwrap().starts_with("Submission ID,"));
    assert!(lines.next().unwrap().contains("Porto Spinning Mill"));
}

#[tokio::test]
async fn test_xlsx_export() {
    let app = TestApp::spawn().await;

    let response = app.send(get("/api/export/xlsx", None)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.header(header::CONTENT_TYPE),
        Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")
    );
    // xlsx is a zip archive.
    assert_eq!(&response.body[..2], b"PK");
}
