//! Scheduled message API and delivery state machine.

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use doc_store::{DocumentStore, MessageFilter};
use integration_tests::{fixtures, mocks::RecordingSender, setup::TestContext};
use policy_core::MessageStatus;
use serde_json::json;
use worker::MessageProcessor;

fn server(ctx: &TestContext) -> TestServer {
    TestServer::new(ctx.router.clone()).expect("Failed to create test server")
}

#[tokio::test]
async fn create_returns_201_with_defaults_applied() {
    let ctx = TestContext::new();
    let server = server(&ctx);

    let response = server
        .post("/api/messages")
        .json(&json!({
            "message": "Policy renewal reminder",
            "scheduledDate": "2030-06-15",
            "scheduledTime": "09:30",
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["priority"], "medium");
    assert_eq!(body["data"]["scheduledAt"], "2030-06-15T09:30:00Z");
}

#[tokio::test]
async fn create_validation_failures_leave_the_store_unchanged() {
    let ctx = TestContext::new();
    let server = server(&ctx);

    for payload in [
        json!({ "message": "", "scheduledDate": "2030-06-15", "scheduledTime": "09:30" }),
        json!({ "message": "x", "scheduledDate": "15/06/2030", "scheduledTime": "09:30" }),
        json!({ "message": "x", "scheduledDate": "2030-06-15", "scheduledTime": "9:75" }),
        json!({ "message": "x", "scheduledDate": "2030-06-15", "scheduledTime": "09:30", "priority": "urgent" }),
        fixtures::past_message_payload(),
    ] {
        let response = server.post("/api/messages").json(&payload).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], false);
    }

    let page = ctx
        .store
        .list_messages(MessageFilter::default())
        .await
        .unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn get_unknown_message_returns_404() {
    let ctx = TestContext::new();
    let server = server(&ctx);

    let response = server
        .get(&format!("/api/messages/{}", uuid::Uuid::new_v4()))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_paginates_and_filters_by_status() {
    let ctx = TestContext::new();
    let server = server(&ctx);

    for day in 1..=15 {
        let payload = json!({
            "message": format!("Reminder {}", day),
            "scheduledDate": format!("2030-06-{:02}", day),
            "scheduledTime": "09:00",
        });
        server
            .post("/api/messages")
            .json(&payload)
            .await
            .assert_status(StatusCode::CREATED);
    }

    let response = server
        .get("/api/messages")
        .add_query_param("page", "2")
        .add_query_param("limit", "10")
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["messages"].as_array().unwrap().len(), 5);
    assert_eq!(body["data"]["pagination"]["total"], 15);
    assert_eq!(body["data"]["pagination"]["pages"], 2);

    // Ordered by scheduled instant: page 2 starts at day 11.
    assert_eq!(body["data"]["messages"][0]["day"], "2030-06-11");

    let response = server
        .get("/api/messages")
        .add_query_param("status", "sent")
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["pagination"]["total"], 0);
}

#[tokio::test]
async fn update_patches_fields_and_revalidates_the_schedule() {
    let ctx = TestContext::new();
    let server = server(&ctx);

    let created: serde_json::Value = server
        .post("/api/messages")
        .json(&fixtures::future_message_payload())
        .await
        .json();
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let response = server
        .put(&format!("/api/messages/{}", id))
        .json(&json!({ "scheduledDate": "2031-01-01" }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["day"], "2031-01-01");
    // Unchanged time is kept and revalidated with the new date.
    assert_eq!(body["data"]["time"], "09:30");

    let response = server
        .put(&format!("/api/messages/{}", id))
        .json(&json!({ "scheduledDate": "2001-01-01" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_removes_the_message() {
    let ctx = TestContext::new();
    let server = server(&ctx);

    let created: serde_json::Value = server
        .post("/api/messages")
        .json(&fixtures::future_message_payload())
        .await
        .json();
    let id = created["data"]["id"].as_str().unwrap().to_string();

    server
        .delete(&format!("/api/messages/{}", id))
        .await
        .assert_status_ok();
    server
        .get(&format!("/api/messages/{}", id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .delete(&format!("/api/messages/{}", id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn processor_drives_due_messages_to_terminal_states() {
    let ctx = TestContext::new();
    let sender = Arc::new(RecordingSender::new());

    // A due message: insert directly so the past schedule is accepted.
    let mut due = policy_core::CreateMessageRequest {
        message: "renewal".into(),
        scheduled_date: "2030-01-01".into(),
        scheduled_time: "09:00".into(),
        recipient: None,
        priority: None,
    }
    .into_message(chrono::Utc::now())
    .unwrap();
    due.scheduled_at = chrono::Utc::now() - chrono::Duration::minutes(1);
    let due = ctx.store.insert_message(due).await.unwrap();

    let store = ctx.store.clone() as Arc<dyn DocumentStore>;
    let processor = MessageProcessor::new(store.clone(), sender.clone());
    assert_eq!(processor.tick().await, 1);

    let message = ctx.store.get_message(due.id).await.unwrap().unwrap();
    assert_eq!(message.status, MessageStatus::Sent);
    assert!(message.sent_at.is_some());
    assert_eq!(sender.delivered(), vec![due.id]);

    // Terminal: later ticks never pick it up again.
    assert_eq!(processor.tick().await, 0);
}

#[tokio::test]
async fn failed_delivery_is_terminal_with_the_error_recorded() {
    let ctx = TestContext::new();
    let sender = Arc::new(RecordingSender::new());
    sender.set_should_fail(true);

    let mut due = policy_core::CreateMessageRequest {
        message: "renewal".into(),
        scheduled_date: "2030-01-01".into(),
        scheduled_time: "09:00".into(),
        recipient: None,
        priority: None,
    }
    .into_message(chrono::Utc::now())
    .unwrap();
    due.scheduled_at = chrono::Utc::now() - chrono::Duration::minutes(1);
    let due = ctx.store.insert_message(due).await.unwrap();

    let store = ctx.store.clone() as Arc<dyn DocumentStore>;
    let processor = MessageProcessor::new(store, sender.clone());
    processor.tick().await;

    let message = ctx.store.get_message(due.id).await.unwrap().unwrap();
    assert_eq!(message.status, MessageStatus::Failed);
    assert!(message
        .error_message
        .as_deref()
        .unwrap()
        .contains("Failed to send message"));
    assert_eq!(processor.tick().await, 0);
}
