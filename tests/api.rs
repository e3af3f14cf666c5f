//! REST surface tests, driven through the router without a socket.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use notes_collab::config::Config;
use notes_collab::db::{MemoryNoteStore, NoteStore};
use notes_collab::{build_app, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

fn test_app() -> (Router, Arc<MemoryNoteStore>) {
    let store = Arc::new(MemoryNoteStore::new());
    let state = Arc::new(AppState::new(Config::default(), store.clone()));
    (build_app(state), store)
}

async fn call(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _) = test_app();
    let (status, body) = call(app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn create_then_fetch_note() {
    let (app, _) = test_app();

    let (status, body) = call(app.clone(), "POST", "/api/notes", Some(json!({"title": "  Groceries "}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["title"], "Groceries");
    assert_eq!(body["data"]["content"], "");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = call(app, "GET", &format!("/api/notes/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["note"]["id"], id);
    assert_eq!(body["data"]["versions"], json!([]));
}

#[tokio::test]
async fn create_requires_a_title() {
    let (app, _) = test_app();
    let (status, body) = call(app.clone(), "POST", "/api/notes", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Title is required");

    let (status, _) = call(app, "POST", "/api/notes", Some(json!({"title": "   "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn fetch_rejects_bad_and_unknown_ids() {
    let (app, _) = test_app();
    let (status, _) = call(app.clone(), "GET", "/api/notes/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(app, "GET", &format!("/api/notes/{}", Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Note not found");
}

#[tokio::test]
async fn update_records_a_manual_version() {
    let (app, store) = test_app();
    let note = store.create_note("Draft").await.unwrap();

    let uri = format!("/api/notes/{}", note.id);
    let (status, body) = call(app.clone(), "PUT", &uri, Some(json!({"content": "offline edit"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["note"]["content"], "offline edit");
    assert_eq!(body["data"]["versions"][0]["origin"], "manual-update");

    // Missing content keeps the current text but still snapshots it
    let (status, body) = call(app.clone(), "PUT", &uri, Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["note"]["content"], "offline edit");
    assert_eq!(body["data"]["versions"].as_array().unwrap().len(), 2);

    let (status, _) = call(app, "PUT", &format!("/api/notes/{}", Uuid::new_v4()), Some(json!({"content": "x"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn diagnostics_counts_rooms() {
    let (app, _) = test_app();
    let (status, body) = call(app, "GET", "/api/v1/diagnostics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["n_rooms"], 0);
    assert_eq!(body["n_sessions"], 0);
}

#[tokio::test]
async fn unknown_routes_return_json_404() {
    let (app, _) = test_app();
    let (status, body) = call(app, "GET", "/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Route not found");
}
