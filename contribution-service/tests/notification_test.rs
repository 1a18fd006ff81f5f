mod common;

use common::TestApp;
use reqwest::StatusCode;
use serde_json::json;

async fn upload(app: &TestApp, title: &str) {
    let response = app.post_upload(json!({ "title": title })).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    app.wait_until_idle().await;
}

#[tokio::test]
async fn unread_count_starts_hidden() {
    let app = TestApp::spawn().await;

    let unread = app.unread().await;

    assert_eq!(unread["count"], 0);
    assert!(unread["badge"].is_null());
}

#[tokio::test]
async fn successful_upload_raises_unread_count() {
    let app = TestApp::spawn().await;

    upload(&app, "Algebra").await;
    upload(&app, "Geometry").await;

    app.wait_for_unread(2).await;
    assert_eq!(app.unread().await["badge"], "2");

    let list = app.get_json("/api/notifications").await;
    let notifications = list["notifications"].as_array().unwrap();
    assert_eq!(list["unread"], 2);
    assert_eq!(
        notifications[0]["message"], "Document: Geometry (ID: doc_2)",
        "newest notification comes first"
    );
}

#[tokio::test]
async fn mark_read_and_delete_update_unread_count() {
    let app = TestApp::spawn().await;
    upload(&app, "Algebra").await;
    upload(&app, "Geometry").await;

    let list = app.get_json("/api/notifications").await;
    let ids: Vec<i64> = list["notifications"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["id"].as_i64().unwrap())
        .collect();

    let response = app
        .client
        .post(app.url(&format!("/api/notifications/{}/read", ids[0])))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    app.wait_for_unread(1).await;

    let response = app
        .client
        .delete(app.url(&format!("/api/notifications/{}", ids[1])))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    app.wait_for_unread(0).await;

    let list = app.get_json("/api/notifications").await;
    assert_eq!(list["notifications"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn mark_all_read_clears_badge() {
    let app = TestApp::spawn().await;
    upload(&app, "Algebra").await;
    upload(&app, "Geometry").await;

    let response = app
        .client
        .post(app.url("/api/notifications/read-all"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["updated"], 2);

    app.wait_for_unread(0).await;
    assert!(app.unread().await["badge"].is_null());
}

#[tokio::test]
async fn unknown_notification_is_not_found() {
    let app = TestApp::spawn().await;

    let read = app
        .client
        .post(app.url("/api/notifications/999/read"))
        .send()
        .await
        .unwrap();
    let delete = app
        .client
        .delete(app.url("/api/notifications/999"))
        .send()
        .await
        .unwrap();

    assert_eq!(read.status(), StatusCode::NOT_FOUND);
    assert_eq!(delete.status(), StatusCode::NOT_FOUND);
}
