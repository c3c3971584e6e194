//! Router-level tests for the three binding endpoints.
//!
//! Requests go through `build_router` with `tower::ServiceExt::oneshot`
//! against an in-memory SQLite store.

#![cfg(feature = "sqlite")]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

use hwid_registry::server::database::{Database, NewBinding};
use hwid_registry::server::handlers::AppState;
use hwid_registry::server::logging::REQUEST_ID_HEADER;
use hwid_registry::server::routes::build_router;

/// Helper: in-memory SQLite database with the bindings table.
async fn setup_in_memory_db() -> Arc<Database> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("db connect failed");

    let db = Database::SQLite(pool);
    db.ensure_schema().await.expect("schema create failed");
    Arc::new(db)
}

async fn setup_test_app() -> (Router, Arc<Database>) {
    let db = setup_in_memory_db().await;
    (build_router(AppState::new(db.clone())), db)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn store_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/store")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn store(app: &Router, license_key: &str, hwid: &str) {
    let (status, body) = send(app, store_request(json!({ "licenseKey": license_key, "hwid": hwid }))).await;
    assert_eq!(status, StatusCode::OK, "store failed: {body}");
}

#[tokio::test]
async fn store_then_lookup_returns_the_record() {
    let (app, _db) = setup_test_app().await;

    let (status, body) = send(
        &app,
        store_request(json!({ "licenseKey": "LIC-1", "hwid": "HW-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Data stored successfully" }));

    let (status, body) = send(&app, get_request("/LIC-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Data retrieved successfully");

    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["licenseKey"], "LIC-1");
    assert_eq!(data[0]["hwid"], "HW-1");
    assert!(data[0]["id"].is_i64());
}

#[tokio::test]
async fn store_with_missing_field_is_rejected_without_writing() {
    let (app, db) = setup_test_app().await;

    let cases = [
        json!({ "hwid": "HW-1" }),
        json!({ "licenseKey": "LIC-1" }),
        json!({ "licenseKey": "", "hwid": "HW-1" }),
        json!({ "licenseKey": "LIC-1", "hwid": "" }),
        json!({ "licenseKey": null, "hwid": "HW-1" }),
        json!({}),
    ];

    for case in cases {
        let (status, body) = send(&app, store_request(case.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "case {case}");
        assert_eq!(body["error"], "Both licenseKey and hwid are required");
        assert_eq!(body["code"], "MISSING_FIELD");
    }

    assert!(db.list_bindings().await.unwrap().is_empty());
}

#[tokio::test]
async fn store_with_unparseable_body_is_a_client_error() {
    let (app, db) = setup_test_app().await;

    let malformed = Request::builder()
        .method("POST")
        .uri("/store")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, malformed).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_REQUEST");

    let no_content_type = Request::builder()
        .method("POST")
        .uri("/store")
        .body(Body::from(r#"{"licenseKey":"LIC-1","hwid":"HW-1"}"#))
        .unwrap();
    let (status, _) = send(&app, no_content_type).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let wrong_type = store_request(json!({ "licenseKey": 42, "hwid": "HW-1" }));
    let (status, _) = send(&app, wrong_type).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(db.list_bindings().await.unwrap().is_empty());
}

#[tokio::test]
async fn lookup_of_unknown_key_is_not_found() {
    let (app, _db) = setup_test_app().await;
    store(&app, "LIC-1", "HW-1").await;

    let (status, body) = send(&app, get_request("/LIC-404")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Data not found for the given license key");
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn lookup_with_repeated_hwid_succeeds_with_all_records() {
    let (app, _db) = setup_test_app().await;
    store(&app, "LIC-1", "HW-1").await;
    store(&app, "LIC-1", "HW-1").await;

    let (status, body) = send(&app, get_request("/LIC-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn lookup_with_differing_hwids_is_a_conflict() {
    let (app, _db) = setup_test_app().await;
    store(&app, "LIC-1", "HW-1").await;
    store(&app, "LIC-1", "HW-2").await;
    store(&app, "LIC-1", "HW-1").await;
    store(&app, "LIC-2", "HW-9").await;

    let (status, body) = send(&app, get_request("/LIC-1")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Multiple HWIDs found for the same license key");

    let records = body["conflictingRecords"].as_array().unwrap();
    assert_eq!(records.len(), 3);
    let hwids: Vec<&str> = records.iter().map(|r| r["hwid"].as_str().unwrap()).collect();
    assert_eq!(hwids, vec!["HW-1", "HW-2", "HW-1"]);
    assert!(records.iter().all(|r| r["licenseKey"] == "LIC-1"));
}

#[tokio::test]
async fn listing_without_conflicts_returns_every_record() {
    let (app, _db) = setup_test_app().await;
    store(&app, "A", "1").await;
    store(&app, "A", "1").await;
    store(&app, "B", "2").await;

    let (status, body) = send(&app, get_request("/data")).await;
    assert_eq!(status, StatusCode::OK);

    let records = body.as_array().unwrap();
    assert_eq!(records.len(), 3);
    let pairs: Vec<(&str, &str)> = records
        .iter()
        .map(|r| (r["licenseKey"].as_str().unwrap(), r["hwid"].as_str().unwrap()))
        .collect();
    assert_eq!(pairs, vec![("A", "1"), ("A", "1"), ("B", "2")]);
}

#[tokio::test]
async fn listing_with_a_conflict_hides_the_full_listing() {
    let (app, _db) = setup_test_app().await;
    store(&app, "A", "1").await;
    store(&app, "A", "2").await;
    store(&app, "B", "3").await;

    let (status, body) = send(&app, get_request("/data")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Multiple HWIDs found for the same license key");

    let groups = body["conflictingRecords"].as_array().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["licenseKey"], "A");
    assert_eq!(groups[0]["records"].as_array().unwrap().len(), 2);
    assert!(!body.to_string().contains("\"B\""));
}

#[tokio::test]
async fn listing_of_empty_store_is_an_empty_array() {
    let (app, _db) = setup_test_app().await;

    let (status, body) = send(&app, get_request("/data")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn repeated_reads_are_identical() {
    let (app, _db) = setup_test_app().await;
    store(&app, "A", "1").await;
    store(&app, "B", "2").await;
    store(&app, "C", "3").await;
    store(&app, "C", "4").await;

    for uri in ["/data", "/A", "/C", "/missing"] {
        let first = send(&app, get_request(uri)).await;
        let second = send(&app, get_request(uri)).await;
        assert_eq!(first, second, "uri {uri}");
    }
}

#[tokio::test]
async fn lookup_decodes_percent_encoded_keys() {
    let (app, db) = setup_test_app().await;
    db.insert_binding(&NewBinding::new("LIC 1", "HW-1"))
        .await
        .unwrap();

    let (status, body) = send(&app, get_request("/LIC%201")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["licenseKey"], "LIC 1");
}

#[tokio::test]
async fn key_named_store_can_be_looked_up() {
    let (app, _db) = setup_test_app().await;

    let (status, _) = send(&app, get_request("/store")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    store(&app, "store", "HW-1").await;

    let (status, body) = send(&app, get_request("/store")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Data retrieved successfully");
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["licenseKey"], "store");
    assert_eq!(data[0]["hwid"], "HW-1");

    store(&app, "store", "HW-2").await;
    let (status, body) = send(&app, get_request("/store")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["conflictingRecords"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn storage_failures_are_opaque_server_errors() {
    let (app, db) = setup_test_app().await;
    store(&app, "A", "1").await;

    match &*db {
        Database::SQLite(pool) => pool.close().await,
        #[allow(unreachable_patterns)]
        _ => unreachable!("test database is SQLite"),
    }

    let (status, body) = send(&app, get_request("/data")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
    assert_eq!(body["code"], "DATABASE_ERROR");

    let (status, _) = send(&app, get_request("/A")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (status, _) = send(&app, store_request(json!({ "licenseKey": "A", "hwid": "2" }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let (app, _db) = setup_test_app().await;

    let response = app.clone().oneshot(get_request("/data")).await.unwrap();
    let id = response
        .headers()
        .get(REQUEST_ID_HEADER)
        .expect("missing request id header");
    assert!(uuid_like(id.to_str().unwrap()));
}

fn uuid_like(s: &str) -> bool {
    s.len() == 36 && s.chars().filter(|c| *c == '-').count() == 4
}
