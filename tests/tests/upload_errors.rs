//! Upload gateway error handling.
//!
//! Gate rejections (extension, size, missing file) must happen before a
//! worker is spawned and leave the store untouched. Worker failures map
//! to 500 and still clean up the temp file.

use std::sync::Arc;
use std::time::Duration;

use api::{router, AppState};
use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use doc_store::DocumentStore;
use integration_tests::{fixtures, mocks::SlowStore, setup::TestContext};
use policy_core::limits;

fn file_form(name: &str, data: Vec<u8>) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(data)
            .file_name(name)
            .mime_type("application/octet-stream"),
    )
}

#[tokio::test]
async fn unsupported_extension_is_rejected_before_processing() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server
        .post("/api/upload")
        .multipart(file_form("records.pdf", b"%PDF-1.4".to_vec()))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Only CSV and XLSX files are allowed");

    assert_eq!(ctx.store.policy_count(), 0);
    assert_eq!(ctx.upload_dir_entries(), 0);
}

#[tokio::test]
async fn missing_file_field_is_rejected() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server
        .post("/api/upload")
        .multipart(MultipartForm::new().add_text("note", "no file here"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["message"], "No file uploaded");
}

#[tokio::test]
async fn oversized_file_is_rejected() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let data = vec![b'x'; limits::MAX_UPLOAD_SIZE_BYTES + 1];
    let response = server
        .post("/api/upload")
        .multipart(file_form("records.csv", data))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["message"], "File size exceeds the 10MB limit");
    assert_eq!(ctx.store.policy_count(), 0);
}

#[tokio::test]
async fn worker_timeout_returns_500_and_cleans_up() {
    // A store that stalls entity creation far past the worker budget.
    let store: Arc<dyn DocumentStore> = Arc::new(SlowStore::new(Duration::from_secs(60)));
    let upload_dir = tempfile::TempDir::new().expect("Failed to create upload dir");
    let state = AppState::new(store, upload_dir.path().to_path_buf())
        .with_worker_timeout(Duration::from_millis(200));
    let server = TestServer::new(router(state)).expect("Failed to create test server");

    let rows = vec![fixtures::csv_row("Smith", "a@example.com", "P-1")];
    let response = server
        .post("/api/upload")
        .multipart(file_form("records.csv", fixtures::csv_file(&rows)))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Error processing file");

    // Cleanup runs on the failure path too.
    let remaining = std::fs::read_dir(upload_dir.path()).unwrap().count();
    assert_eq!(remaining, 0);
}

#[tokio::test]
async fn unparseable_file_contents_return_500() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    // Valid extension, but not an XLSX archive.
    let response = server
        .post("/api/upload")
        .multipart(file_form("records.xlsx", b"not a zip".to_vec()))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json();
    assert_eq!(body["message"], "Error processing file");
    assert_eq!(ctx.upload_dir_entries(), 0);
}
