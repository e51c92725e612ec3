//! Integration tests for HttpBackend and the controller against a mock server

use std::sync::Arc;

use ask_client::{AskRequest, Backend, BackendError, HttpBackend, QueryController};
use ask_core::{ContextStore, MemoryStore, QueryPhase, RenderStyle};
use futures::StreamExt;
use parking_lot::RwLock;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend(server: &MockServer) -> HttpBackend {
    let client = reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("Failed to build HTTP client");
    HttpBackend::with_client(client, &server.uri())
}

fn ask_request() -> AskRequest {
    AskRequest {
        question: "What is the penalty for X?".to_string(),
        transcript: None,
        pdf_indexed: true,
        session_id: "sid-test".to_string(),
    }
}

#[tokio::test]
async fn status_reports_indexed_document() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "pdf_processed": true })))
        .expect(1)
        .mount(&server)
        .await;

    let status = backend(&server).status().await.unwrap();

    assert!(status.pdf_processed);
}

#[tokio::test]
async fn ask_sends_context_and_streams_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .and(body_json(json!({
            "question": "What is the penalty for X?",
            "transcript": null,
            "pdf_indexed": true,
            "session_id": "sid-test"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/plain")
                .set_body_string("The penalty is a two-stroke penalty."),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut stream = backend(&server).ask(&ask_request()).await.unwrap();
    let mut body = Vec::new();
    while let Some(chunk) = stream.next().await {
        body.extend_from_slice(&chunk.unwrap());
    }

    assert_eq!(body, b"The penalty is a two-stroke penalty.");
}

#[tokio::test]
async fn ask_error_status_carries_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "error": "model unavailable" })),
        )
        .mount(&server)
        .await;

    let result = backend(&server).ask(&ask_request()).await;

    match result {
        Err(BackendError::Server { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "model unavailable");
        }
        Err(other) => panic!("expected server error, got {other:?}"),
        Ok(_) => panic!("expected server error, got a stream"),
    }
}

#[tokio::test]
async fn ask_error_without_body_uses_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let result = backend(&server).ask(&ask_request()).await;

    assert!(matches!(
        result,
        Err(BackendError::Server { ref message, .. }) if message == "Unknown server error"
    ));
}

#[tokio::test]
async fn stop_posts_session_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/stop"))
        .and(body_json(json!({ "session_id": "sid-test" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "stopped": true })))
        .expect(1)
        .mount(&server)
        .await;

    backend(&server).stop("sid-test").await.unwrap();
}

#[tokio::test]
async fn process_pdf_uploads_file_and_returns_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/process-pdf"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({
                "message": "PDF processed and indexed successfully!",
                "pdf_filename": "rules.pdf"
            })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("rules.pdf");
    std::fs::write(&file, b"%PDF-1.4").unwrap();

    let upload = backend(&server).process_pdf(&file).await.unwrap();

    assert_eq!(upload.pdf_filename, "rules.pdf");
    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"pdf\""));
    assert!(body.contains("filename=\"rules.pdf\""));
}

#[tokio::test]
async fn process_audio_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/process-audio"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({ "error": "Audio processing failed: timeout" })),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("meeting.mp3");
    std::fs::write(&file, b"ID3").unwrap();

    let err = backend(&server).process_audio(&file).await.unwrap_err();

    assert_eq!(err.to_string(), "Audio processing failed: timeout");
}

#[tokio::test]
async fn process_audio_returns_transcript() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/process-audio"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transcript": "we agreed on ten",
            "audio_filename": "meeting.mp3"
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("meeting.mp3");
    std::fs::write(&file, b"ID3").unwrap();

    let upload = backend(&server).process_audio(&file).await.unwrap();

    assert_eq!(upload.transcript.as_deref(), Some("we agreed on ten"));
    assert_eq!(upload.audio_filename, "meeting.mp3");
}

#[tokio::test]
async fn reset_index_failure_surfaces_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/reset-index"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "locked" })))
        .mount(&server)
        .await;

    let err = backend(&server).reset_index().await.unwrap_err();

    assert_eq!(err.to_string(), "locked");
}

#[tokio::test]
async fn controller_renders_server_error_message_exactly() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "error": "model unavailable" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut context = ContextStore::new(Arc::new(MemoryStore::new()));
    context.set_document_indexed(true);
    let (controller, _events) = QueryController::new(
        Arc::new(backend(&server)),
        Arc::new(RwLock::new(context)),
        RenderStyle::html(),
    );

    let report = controller
        .submit_question("What is the penalty for X?")
        .await
        .unwrap();

    assert_eq!(report.phase, QueryPhase::Failed);
    assert_eq!(report.output, "model unavailable");
}

#[tokio::test]
async fn controller_streams_answer_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/plain")
                .set_body_string("Line one\nLine two"),
        )
        .mount(&server)
        .await;

    let mut context = ContextStore::new(Arc::new(MemoryStore::new()));
    context.set_transcript(Some("we agreed on ten".to_string()));
    let (controller, _events) = QueryController::new(
        Arc::new(backend(&server)),
        Arc::new(RwLock::new(context)),
        RenderStyle::html(),
    );

    let report = controller.submit_question("Summarise").await.unwrap();

    assert_eq!(report.phase, QueryPhase::Completed);
    assert_eq!(report.output, "Line one<br>Line two");

    let requests = server.received_requests().await.unwrap();
    let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(sent["transcript"], "we agreed on ten");
    assert_eq!(sent["pdf_indexed"], false);
}
