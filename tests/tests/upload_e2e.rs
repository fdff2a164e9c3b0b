//! End-to-end tests for the upload pipeline.
//!
//! POST /api/upload -> temp file -> isolated ingestion worker -> store.
//! Everything runs in-process against the real router and an in-memory
//! store, so the full production code path is exercised except disk and
//! network transport.

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use integration_tests::{fixtures, setup::TestContext};

fn csv_form(name: &str, data: Vec<u8>) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(data).file_name(name).mime_type("text/csv"),
    )
}

#[tokio::test]
async fn upload_resolves_rows_into_the_entity_graph() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    // Rows 1 and 2 share an agent; row 3 has an unparseable premium,
    // which maps to 0.0 rather than failing the row.
    let rows = vec![
        fixtures::csv_row("Smith", "a@example.com", "P-1"),
        fixtures::csv_row("Smith", "b@example.com", "P-2"),
        fixtures::csv_row("Jones", "c@example.com", "P-3").replace(",1100,", ",n/a,"),
    ];

    let response = server
        .post("/api/upload")
        .multipart(csv_form("records.csv", fixtures::csv_file(&rows)))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);

    let summary = &body["data"];
    assert_eq!(summary["agentsCreated"], 2);
    assert_eq!(summary["usersCreated"], 3);
    assert_eq!(summary["policiesCreated"], 3);
    assert_eq!(summary["errors"].as_array().map(|e| e.len()), Some(0));

    assert_eq!(ctx.store.policy_count(), 3);
    assert_eq!(
        ctx.store.policy_by_number("P-3").unwrap().premium_amount,
        0.0
    );

    // Temp file is gone once the worker has replied.
    assert_eq!(ctx.upload_dir_entries(), 0);
}

#[tokio::test]
async fn rows_sharing_keys_reuse_ids_within_one_upload() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let rows = vec![
        fixtures::csv_row("Smith", "a@example.com", "P-1"),
        fixtures::csv_row("Smith", "a@example.com", "P-2"),
    ];

    let response = server
        .post("/api/upload")
        .multipart(csv_form("records.csv", fixtures::csv_file(&rows)))
        .await;
    response.assert_status_ok();

    let first = ctx.store.policy_by_number("P-1").unwrap();
    let second = ctx.store.policy_by_number("P-2").unwrap();
    assert_eq!(first.agent_id, second.agent_id);
    assert_eq!(first.user_id, second.user_id);
}

#[tokio::test]
async fn duplicate_email_across_uploads_is_a_row_error() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let first = vec![fixtures::csv_row("Smith", "a@example.com", "P-1")];
    server
        .post("/api/upload")
        .multipart(csv_form("records.csv", fixtures::csv_file(&first)))
        .await
        .assert_status_ok();

    // Second run has no shared dedup maps, so the user hits the store's
    // unique email constraint and its policy loses a reference.
    let second = vec![fixtures::csv_row("Smith", "a@example.com", "P-9")];
    let response = server
        .post("/api/upload")
        .multipart(csv_form("records.csv", fixtures::csv_file(&second)))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    let errors = body["data"]["errors"].as_array().unwrap();
    assert!(errors
        .iter()
        .any(|e| e.as_str().unwrap().contains("User creation failed: a@example.com")));
    assert!(ctx.store.policy_by_number("P-9").is_none());
}
