//! Drives the Chat Completions client against throw-away local servers.

use std::sync::{Arc, Mutex};

use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
use mindmap_ai::{
    LlmProvider, MindMapGenerator, OpenAiCompatibleConfig, OpenAiCompatibleProvider,
};
use mindmap_core::MindMapError;
use secrecy::SecretString;
use serde_json::{json, Value};

#[derive(Clone, Default)]
struct Captured {
    body: Arc<Mutex<Option<Value>>>,
    auth: Arc<Mutex<Option<String>>>,
}

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/v1")
}

fn provider(base_url: String) -> OpenAiCompatibleProvider {
    OpenAiCompatibleProvider::new(OpenAiCompatibleConfig {
        base_url,
        timeout_secs: 5,
        api_key: Some(SecretString::from("sk-test".to_string())),
        ..OpenAiCompatibleConfig::default()
    })
    .unwrap()
}

fn completion(content: &str) -> Value {
    json!({
        "id": "cmpl-1",
        "object": "chat.completion",
        "model": "deepseek-chat",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 10, "completion_tokens": 20, "total_tokens": 30 }
    })
}

#[tokio::test]
async fn sends_model_messages_temperature_and_bearer_key() {
    let captured = Captured::default();
    let graph = r#"{"nodes":[{"id":"1","label":"Photosynthesis"},{"id":"2","label":"Light"}],"edges":[{"id":"e1","source":"1","target":"2"}]}"#;
    let reply = completion(graph);

    let router = Router::new()
        .route(
            "/v1/chat/completions",
            post(
                |State(captured): State<Captured>, headers: HeaderMap, Json(body): Json<Value>| async move {
                    *captured.body.lock().unwrap() = Some(body);
                    *captured.auth.lock().unwrap() = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    Json(reply)
                },
            ),
        )
        .with_state(captured.clone());
    let base = spawn(router).await;

    let generator = MindMapGenerator::new(Arc::new(provider(base)));
    let graph = generator.generate("Photosynthesis").await.expect("graph");
    assert_eq!(graph.nodes().len(), 2);

    let body = captured.body.lock().unwrap().clone().expect("request body");
    assert_eq!(body["model"], "deepseek-chat");
    assert_eq!(body["messages"].as_array().unwrap().len(), 2);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["role"], "user");
    assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    assert_eq!(
        captured.auth.lock().unwrap().as_deref(),
        Some("Bearer sk-test")
    );
}

#[tokio::test]
async fn http_error_is_provider_unavailable() {
    let router = Router::new().route(
        "/v1/chat/completions",
        post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "overloaded") }),
    );
    let base = spawn(router).await;

    let err = provider(base)
        .generate_chat(&[], &Default::default())
        .await
        .unwrap_err();
    match err {
        MindMapError::ProviderUnavailable(msg) => assert!(msg.contains("overloaded"), "{msg}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_endpoint_is_provider_unavailable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = provider(format!("http://{addr}/v1"))
        .generate_chat(&[], &Default::default())
        .await
        .unwrap_err();
    assert!(matches!(err, MindMapError::ProviderUnavailable(_)));
}

#[tokio::test]
async fn non_json_completion_body_is_malformed() {
    let router = Router::new().route(
        "/v1/chat/completions",
        post(|| async { "<html>gateway</html>" }),
    );
    let base = spawn(router).await;

    let err = provider(base)
        .generate_chat(&[], &Default::default())
        .await
        .unwrap_err();
    assert!(matches!(err, MindMapError::MalformedModelOutput(_)));
}

#[tokio::test]
async fn empty_choices_are_malformed() {
    let router = Router::new().route(
        "/v1/chat/completions",
        post(|| async { Json(json!({ "choices": [] })) }),
    );
    let base = spawn(router).await;

    let err = provider(base)
        .generate_chat(&[], &Default::default())
        .await
        .unwrap_err();
    assert!(matches!(err, MindMapError::MalformedModelOutput(_)));
}

#[tokio::test]
async fn prose_completion_is_malformed_model_output() {
    let reply = completion("I'm sorry, I can't help with that.");
    let router = Router::new().route(
        "/v1/chat/completions",
        post(move || async move { Json(reply) }),
    );
    let base = spawn(router).await;

    let generator = MindMapGenerator::new(Arc::new(provider(base)));
    assert!(matches!(
        generator.generate("Rust").await,
        Err(MindMapError::MalformedModelOutput(_))
    ));
}
