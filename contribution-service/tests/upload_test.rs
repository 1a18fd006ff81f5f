mod common;

use common::{read_sse_until, TestApp};
use contribution_service::services::MockMetadataStore;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn upload_is_accepted_and_completes() {
    let app = TestApp::spawn_with_store(MockMetadataStore::new().with_next_id(42)).await;

    let response = app
        .post_upload(json!({ "title": "Math notes", "description": "Chapter 1" }))
        .await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["submission_id"].is_string());

    app.wait_until_idle().await;

    let documents = app.metadata.documents().await;
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].id, "doc_42");
    assert_eq!(documents[0].title, "Math notes");
    assert_eq!(documents[0].description.as_deref(), Some("Chapter 1"));
    assert_eq!(documents[0].author_id, "user_001");

    let list = app.get_json("/api/notifications").await;
    let notifications = list["notifications"].as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["title"], "Upload successful");
    assert_eq!(notifications[0]["message"], "Document: Math notes (ID: doc_42)");
    assert_eq!(notifications[0]["time_text"], "Today");
    assert_eq!(notifications[0]["kind"], "SUCCESS");
    assert_eq!(notifications[0]["is_read"], false);
}

#[tokio::test]
async fn status_reports_upload_in_progress() {
    let app = TestApp::spawn().await;

    app.post_upload(json!({ "title": "Physics" })).await;

    assert!(app.is_uploading().await);
    app.wait_until_idle().await;
    assert!(!app.is_uploading().await);
}

#[tokio::test]
async fn blank_title_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app.post_upload(json!({ "title": "   " })).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(!app.is_uploading().await);
    assert_eq!(app.metadata.create_calls(), 0);
}

#[tokio::test]
async fn second_upload_while_in_progress_conflicts() {
    let app = TestApp::spawn().await;

    let first = app.post_upload(json!({ "title": "First" })).await;
    let second = app.post_upload(json!({ "title": "Second" })).await;

    assert_eq!(first.status(), StatusCode::ACCEPTED);
    assert_eq!(second.status(), StatusCode::CONFLICT);

    app.wait_until_idle().await;
    let documents = app.metadata.documents().await;
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].title, "First");
}

#[tokio::test]
async fn success_event_is_streamed() {
    let app = TestApp::spawn().await;

    let mut events = app
        .client
        .get(app.url("/api/uploads/events"))
        .send()
        .await
        .expect("Failed to open event stream");
    assert_eq!(events.status(), StatusCode::OK);

    app.post_upload(json!({ "title": "Chemistry" })).await;

    let received = read_sse_until(&mut events, "saved successfully").await;
    assert!(received.contains("event: terminal"));
    assert!(received.contains(r#""status":"success""#));
    assert!(received.contains("Upload and metadata saved successfully!"));
}

#[tokio::test]
async fn remote_failure_streams_error_and_skips_notification() {
    let app = TestApp::spawn().await;
    app.metadata.fail_writes(Some("remote store offline")).await;

    let mut events = app
        .client
        .get(app.url("/api/uploads/events"))
        .send()
        .await
        .expect("Failed to open event stream");

    app.post_upload(json!({ "title": "Biology" })).await;

    let received = read_sse_until(&mut events, "remote store offline").await;
    assert!(received.contains(r#""status":"error""#));

    app.wait_until_idle().await;
    let list = app.get_json("/api/notifications").await;
    assert!(list["notifications"].as_array().unwrap().is_empty());
    assert_eq!(app.unread().await["count"], 0);
}

#[tokio::test]
async fn successful_upload_appears_in_published_tab() {
    let app = TestApp::spawn().await;

    app.post_upload(json!({ "title": "History", "description": "Week 3" }))
        .await;
    app.wait_until_idle().await;

    let published = app.wait_for_documents("published", 1).await;
    assert_eq!(published[0]["id"], "doc_1");
    assert_eq!(published[0]["title"], "History");
    assert!(published[0]["meta"].as_str().unwrap().starts_with("Week 3 · "));
}
