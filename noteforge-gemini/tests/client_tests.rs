use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json, Router,
};
use noteforge_core::{
    generate_flashcards, Difficulty, GenerationError, GenerationParams, GenerationRequest,
    TextGenerator, MAX_FRESH_COUNT,
};
use noteforge_gemini::{GeminiClient, GeminiConfig};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Clone)]
struct Stub {
    status: StatusCode,
    reply: String,
    delay: Duration,
    seen: Arc<Mutex<Vec<(String, Value)>>>,
}

async fn handle(
    State(stub): State<Stub>,
    uri: axum::http::Uri,
    Query(q): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    stub.seen
        .lock()
        .unwrap()
        .push((format!("{}|{}", uri.path(), q.get("key").cloned().unwrap_or_default()), body));
    tokio::time::sleep(stub.delay).await;
    (stub.status, stub.reply.clone())
}

/// Serves `reply` with `status` on every path; returns the base URL.
async fn serve(status: StatusCode, reply: String, delay: Duration) -> (String, Stub) {
    let stub = Stub { status, reply, delay, seen: Arc::default() };
    let app = Router::new().fallback(handle).with_state(stub.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/models"), stub)
}

fn envelope(text: &str) -> String {
    json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] }).to_string()
}

fn client(base: &str) -> GeminiClient {
    GeminiClient::with_config(GeminiConfig::new("test-key").base_url(base)).unwrap()
}

#[tokio::test]
async fn sends_prompt_and_sampling_config() {
    let (base, stub) = serve(StatusCode::OK, envelope("generated"), Duration::ZERO).await;
    let out = client(&base)
        .generate("hello prompt", &GenerationParams::default())
        .await
        .unwrap();
    assert_eq!(out, "generated");

    let seen = stub.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (target, body) = &seen[0];
    assert_eq!(target, "/models/gemini-2.0-flash:generateContent|test-key");
    assert_eq!(body["contents"][0]["parts"][0]["text"], "hello prompt");
    let cfg = &body["generationConfig"];
    assert_eq!(cfg["topK"], 40);
    assert_eq!(cfg["maxOutputTokens"], 2048);
    assert!((cfg["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    assert!((cfg["topP"].as_f64().unwrap() - 0.95).abs() < 1e-6);
}

#[tokio::test]
async fn error_status_keeps_status_and_body() {
    let (base, stub) = serve(StatusCode::INTERNAL_SERVER_ERROR, "boom".into(), Duration::ZERO).await;
    let err = client(&base)
        .generate("p", &GenerationParams::default())
        .await
        .unwrap_err();
    match err {
        GenerationError::Upstream { status, body } => {
            assert_eq!(status, Some(500));
            assert_eq!(body, "boom");
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
    assert_eq!(stub.seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn envelope_without_text_is_upstream_error() {
    let (base, _) = serve(StatusCode::OK, json!({ "candidates": [] }).to_string(), Duration::ZERO).await;
    let err = client(&base)
        .generate("p", &GenerationParams::default())
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::Upstream { status: Some(200), .. }));
}

#[tokio::test]
async fn missing_key_is_configuration_error() {
    assert!(matches!(GeminiClient::new("   "), Err(GenerationError::Configuration(_))));
}

#[tokio::test]
async fn slow_endpoint_times_out() {
    let (base, _) = serve(StatusCode::OK, envelope("late"), Duration::from_secs(3)).await;
    let client = GeminiClient::with_config(
        GeminiConfig::new("k").base_url(&base).timeout(Duration::from_millis(200)),
    )
    .unwrap();
    let err = client
        .generate("p", &GenerationParams::default())
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::Upstream { status: None, .. }));
}

#[tokio::test]
async fn end_to_end_generation() {
    let text = "Sure!\n[{\"question\":\"Which? A) a B) b C) c D) d\",\"answer\":\"C\",\"difficulty\":\"easy\"}]";
    let (base, _) = serve(StatusCode::OK, envelope(text), Duration::ZERO).await;
    let request = GenerationRequest::new("Some note content long enough.", 1, Difficulty::Easy);
    let result = generate_flashcards(&client(&base), &request, MAX_FRESH_COUNT, &GenerationParams::default())
        .await
        .unwrap();
    assert_eq!(result.flashcards.len(), 1);
    assert_eq!(result.flashcards[0].question, "Which? \nA) a \nB) b \nC) c \nD) d");
    assert_eq!(result.flashcards[0].answer, "C");
    assert!(result.estimated_tokens > 0);
}

#[tokio::test]
async fn key_probe_reflects_status() {
    let (ok, stub) = serve(StatusCode::OK, envelope("hi"), Duration::ZERO).await;
    assert!(client(&ok).validate_key().await);
    let body = &stub.seen.lock().unwrap()[0].1;
    assert_eq!(body["generationConfig"]["maxOutputTokens"], 10);
    assert!(body["generationConfig"].get("temperature").is_none());

    let (denied, _) = serve(StatusCode::FORBIDDEN, "{}".into(), Duration::ZERO).await;
    assert!(!client(&denied).validate_key().await);
}
