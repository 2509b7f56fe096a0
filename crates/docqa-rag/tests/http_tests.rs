//! End-to-end tests of the upload and ask endpoints over fake backends

mod common;

use std::sync::atomic::Ordering;

use axum::{body::Body, http::{Request, StatusCode}};
use common::{ask_request, json_body, upload_request, TestApp};
use docqa_rag::ingestion::document_id;
use serde_json::json;

#[tokio::test]
async fn test_upload_then_ask() {
    let app = TestApp::new();

    let response = app.send(upload_request("greek.txt", b"Alpha Beta Gamma")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["filename"], "greek.txt");
    assert_eq!(body["message"], "File uploaded and indexed");
    assert!(app.upload_dir.path().join("greek.txt").exists());
    assert_eq!(app.embedder.batches(), 1);

    let question = json!({"filename": "greek.txt", "question": "What is Beta?"});
    let response = app.send(ask_request(question.clone())).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(!body["message"].as_str().unwrap().is_empty());

    let prompt = app.llm.last_prompt().unwrap();
    assert!(prompt.contains("Alpha Beta Gamma"));
    assert!(prompt.contains("What is Beta?"));

    // Repeated question reuses the cached index
    let response = app.send(ask_request(question)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.embedder.batches(), 1);
    assert_eq!(app.llm.calls(), 2);
}

#[tokio::test]
async fn test_deferred_indexing_builds_on_first_question() {
    let app = TestApp::with_config(|config| config.server.index_on_upload = false);

    let response = app.send(upload_request("greek.txt", b"Alpha Beta Gamma")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["message"], "File uploaded");
    assert_eq!(app.embedder.batches(), 0);

    let response = app
        .send(ask_request(json!({"filename": "greek.txt", "question": "What is Beta?"})))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.embedder.batches(), 1);
}

#[tokio::test]
async fn test_missing_question_is_bad_request() {
    let app = TestApp::new();
    app.send(upload_request("greek.txt", b"Alpha Beta Gamma")).await;
    let batches = app.embedder.batches();

    let response = app.send(ask_request(json!({"filename": "greek.txt"}))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["type"], "bad_request");

    assert_eq!(app.embedder.batches(), batches);
    assert_eq!(app.embedder.queries(), 0);
    assert_eq!(app.llm.calls(), 0);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::new();
    let request = Request::builder()
        .method("POST")
        .uri("/ask")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.llm.calls(), 0);
}

#[tokio::test]
async fn test_unknown_filename_is_not_found() {
    let app = TestApp::new();

    let response = app
        .send(ask_request(json!({"filename": "never.txt", "question": "Anything?"})))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["error"]["type"], "not_found");
    assert_eq!(app.embedder.batches(), 0);
}

#[tokio::test]
async fn test_upload_without_file_part() {
    let app = TestApp::new();
    let boundary = "docqa-test-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{boundary}--\r\n"
    );
    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header("content-type", format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["message"], "No file uploaded");
}

#[tokio::test]
async fn test_upload_name_cannot_escape_upload_dir() {
    let app = TestApp::new();

    let response = app.send(upload_request("../../escape.txt", b"Alpha Beta Gamma")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["filename"], "escape.txt");
    assert!(app.upload_dir.path().join("escape.txt").exists());
}

#[tokio::test]
async fn test_backend_failure_is_server_error_and_not_cached() {
    let app = TestApp::new();
    app.embedder.fail.store(true, Ordering::SeqCst);

    let response = app.send(upload_request("greek.txt", b"Alpha Beta Gamma")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"]["type"], "embedding_error");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("connection refused"));

    let path = app.state.upload_path("greek.txt");
    assert!(!app.state.pipeline().store().has(&document_id(&path)));

    // Backend recovers: the next request redoes the full embedding pass
    app.embedder.fail.store(false, Ordering::SeqCst);
    let response = app
        .send(ask_request(json!({"filename": "greek.txt", "question": "What is Beta?"})))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.embedder.batches(), 2);
}

#[tokio::test]
async fn test_changed_reupload_invalidates_index() {
    let app = TestApp::new();
    app.send(upload_request("notes.txt", b"Alpha Beta Gamma")).await;
    app.send(upload_request("notes.txt", b"Alpha Beta Gamma")).await;
    assert_eq!(app.embedder.batches(), 1);

    app.send(upload_request("notes.txt", b"Delta Epsilon Zeta")).await;
    assert_eq!(app.embedder.batches(), 2);

    app.send(ask_request(json!({"filename": "notes.txt", "question": "What is Delta?"})))
        .await;
    let prompt = app.llm.last_prompt().unwrap();
    assert!(prompt.contains("Delta Epsilon Zeta"));
    assert!(!prompt.contains("Alpha"));
}

#[tokio::test]
async fn test_empty_document_answers_without_context() {
    let app = TestApp::new();

    let response = app.send(upload_request("empty.txt", b"")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .send(ask_request(json!({"filename": "empty.txt", "question": "Anything?"})))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.embedder.batches(), 0);
    assert_eq!(app.embedder.queries(), 0);
    assert_eq!(app.llm.calls(), 1);
}

#[tokio::test]
async fn test_health_ready_and_info() {
    let app = TestApp::new();

    let health = Request::builder().uri("/health").body(Body::empty()).unwrap();
    assert_eq!(app.send(health).await.status(), StatusCode::OK);

    let ready = Request::builder().uri("/ready").body(Body::empty()).unwrap();
    assert_eq!(app.send(ready).await.status(), StatusCode::OK);

    app.send(upload_request("greek.txt", b"Alpha Beta Gamma")).await;
    let info = Request::builder().uri("/info").body(Body::empty()).unwrap();
    let response = app.send(info).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["name"], "docqa-rag");
    assert_eq!(body["top_k"], 4);
    assert_eq!(body["cache"]["entries"], 1);
    assert_eq!(body["cache"]["builds"], 1);

    app.embedder.fail.store(true, Ordering::SeqCst);
    let ready = Request::builder().uri("/ready").body(Body::empty()).unwrap();
    assert_eq!(app.send(ready).await.status(), StatusCode::SERVICE_UNAVAILABLE);
}
