//! Router behaviour through `oneshot`, plus one end-to-end run with the client gateway.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use mindmap_ai::{GenerationConfig, LlmProvider, LlmResponse, Message, MindMapGenerator};
use mindmap_api::{create_router, AppState, IdentityVerifier, VerifiedUser};
use mindmap_client::{Gateway, StaticToken};
use mindmap_core::{MindMapError, Result};
use serde_json::{json, Value};
use tower::ServiceExt;

const GRAPH: &str = r#"{
  "nodes": [
    {"id": "1", "label": "Photosynthesis"},
    {"id": "2", "label": "Light reactions"},
    {"id": "3", "label": "Calvin cycle"}
  ],
  "edges": [
    {"id": "e1", "source": "1", "target": "2"},
    {"id": "e2", "source": "1", "target": "3"}
  ]
}"#;

enum Reply {
    Content(&'static str),
    Unavailable,
    Panic,
}

struct StubModel {
    reply: Reply,
    calls: AtomicUsize,
}

#[async_trait]
impl LlmProvider for StubModel {
    async fn generate_chat(
        &self,
        _messages: &[Message],
        _config: &GenerationConfig,
    ) -> Result<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.reply {
            Reply::Content(content) => Ok(LlmResponse {
                content: content.to_string(),
                total_tokens: None,
                finish_reason: Some("stop".into()),
                model: "stub".into(),
            }),
            Reply::Unavailable => Err(MindMapError::ProviderUnavailable("upstream down".into())),
            Reply::Panic => panic!("model stub exploded"),
        }
    }

    fn provider_name(&self) -> &str {
        "stub"
    }

    fn model_name(&self) -> &str {
        "stub"
    }
}

struct StubIdentity;

#[async_trait]
impl IdentityVerifier for StubIdentity {
    async fn verify(&self, token: &str) -> Result<VerifiedUser> {
        match token {
            "good-token" => Ok(VerifiedUser {
                id: "user-1".into(),
                email: None,
            }),
            "flaky" => Err(MindMapError::TransportError {
                status: 0,
                body: "identity down".into(),
            }),
            _ => Err(MindMapError::Unauthorized("invalid JWT".into())),
        }
    }
}

fn app_with(reply: Reply, base_path: Option<&str>) -> (Router, Arc<StubModel>) {
    let model = Arc::new(StubModel {
        reply,
        calls: AtomicUsize::new(0),
    });
    let generator = Arc::new(MindMapGenerator::new(model.clone()));
    let state = AppState::new(generator, Arc::new(StubIdentity));
    (create_router(state, base_path), model)
}

fn app() -> (Router, Arc<StubModel>) {
    app_with(Reply::Content(GRAPH), None)
}

fn post(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, headers, body)
}

fn json_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).expect("JSON body")
}

fn assert_cors(headers: &axum::http::HeaderMap) {
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(
        headers["access-control-allow-headers"],
        "authorization, x-client-info, apikey, content-type"
    );
    assert_eq!(headers["access-control-allow-methods"], "GET, POST, OPTIONS");
    assert_eq!(headers["access-control-max-age"], "86400");
}

#[tokio::test]
async fn generate_without_authorization_is_401_and_skips_model() {
    let (app, model) = app();
    let (status, headers, body) =
        send(app, post("/generate", None, json!({ "topic": "Photosynthesis" }))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let body = json_body(&body);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Missing authorization header");
    assert_cors(&headers);
    assert_eq!(model.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn generate_with_valid_token_returns_graph() {
    let (app, model) = app();
    let (status, headers, body) = send(
        app,
        post("/generate", Some("good-token"), json!({ "topic": "Photosynthesis" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_cors(&headers);
    let body = json_body(&body);
    assert_eq!(body["success"], true);

    let nodes = body["data"]["nodes"].as_array().unwrap();
    assert!(!nodes.is_empty());
    let ids: Vec<&str> = nodes.iter().map(|n| n["id"].as_str().unwrap()).collect();
    for edge in body["data"]["edges"].as_array().unwrap() {
        assert!(ids.contains(&edge["source"].as_str().unwrap()));
        assert!(ids.contains(&edge["target"].as_str().unwrap()));
    }
    assert_eq!(model.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn root_path_also_generates() {
    let (app, _) = app();
    let (status, _, _) = send(app, post("/", Some("good-token"), json!({ "topic": "Cells" }))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn malformed_authorization_header_is_401() {
    let (app, model) = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/generate")
        .header(header::AUTHORIZATION, "Token abc")
        .body(Body::from(r#"{"topic":"Cells"}"#))
        .unwrap();
    let (status, _, body) = send(app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(&body)["success"], false);
    assert_eq!(model.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn rejected_or_unverifiable_token_is_401_not_500() {
    for token in ["forged", "flaky"] {
        let (app, model) = app();
        let (status, _, body) =
            send(app, post("/generate", Some(token), json!({ "topic": "Cells" }))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "token {token}");
        assert_eq!(json_body(&body)["success"], false);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }
}

#[tokio::test]
async fn auth_is_checked_before_body() {
    let (app, _) = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/refine")
        .body(Body::from("{{{ not json"))
        .unwrap();
    let (status, _, _) = send(app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_topic_is_400() {
    let (app, model) = app();
    let (status, _, body) = send(app, post("/generate", Some("good-token"), json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(&body),
        json!({ "success": false, "error": "Topic is required" })
    );
    assert_eq!(model.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unparseable_body_is_400() {
    let (app, _) = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/generate")
        .header(header::AUTHORIZATION, "Bearer good-token")
        .body(Body::from("topic=Cells"))
        .unwrap();
    let (status, _, body) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body)["error"], "Topic is required");
}

#[tokio::test]
async fn refine_requires_both_fields() {
    let (router, _) = app();
    let (status, _, body) = send(
        router,
        post("/refine", Some("good-token"), json!({ "topic": "Cells" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body)["error"], "Topic and feedback are required");

    let (app, _) = app();
    let (status, _, body) = send(
        app,
        post(
            "/refine",
            Some("good-token"),
            json!({ "topic": "Cells", "feedback": "Add organelles" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["success"], true);
}

#[tokio::test]
async fn options_anywhere_is_empty_200_with_cors() {
    for uri in ["/generate", "/refine", "/nowhere", "/"] {
        let (app, _) = app();
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri(uri)
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();
        let (status, headers, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert!(body.is_empty(), "{uri}");
        assert_cors(&headers);
    }
}

#[tokio::test]
async fn health_and_ping_are_open() {
    for uri in ["/health", "/ping"] {
        let (app, _) = app();
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let (status, headers, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_cors(&headers);
        let body = json_body(&body);
        assert_eq!(body["status"], "ok");
        assert!(body["timestamp"].is_string());
    }
}

#[tokio::test]
async fn unknown_path_is_404_envelope() {
    let (app, _) = app();
    let request = Request::builder().uri("/test").body(Body::empty()).unwrap();
    let (status, headers, body) = send(app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_cors(&headers);
    assert_eq!(
        json_body(&body),
        json!({ "success": false, "error": "Not Found" })
    );
}

#[tokio::test]
async fn wrong_method_is_405_envelope() {
    let (app, _) = app();
    let request = Request::builder()
        .method(Method::GET)
        .uri("/generate")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(app, request).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        json_body(&body),
        json!({ "success": false, "error": "Method not allowed" })
    );
}

#[tokio::test]
async fn provider_failure_is_500_envelope() {
    let (app, _) = app_with(Reply::Unavailable, None);
    let (status, headers, body) =
        send(app, post("/generate", Some("good-token"), json!({ "topic": "Cells" }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_cors(&headers);
    let body = json_body(&body);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("upstream down"));
}

#[tokio::test]
async fn prose_from_model_is_500_envelope() {
    let (app, _) = app_with(Reply::Content("Here is your mind map!"), None);
    let (status, _, body) =
        send(app, post("/generate", Some("good-token"), json!({ "topic": "Cells" }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json_body(&body)["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid response format from model"));
}

#[tokio::test]
async fn panic_becomes_500_envelope() {
    let (app, _) = app_with(Reply::Panic, None);
    let (status, headers, body) =
        send(app, post("/generate", Some("good-token"), json!({ "topic": "Cells" }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_cors(&headers);
    assert_eq!(json_body(&body)["success"], false);
}

#[tokio::test]
async fn base_path_mounts_routes() {
    let (app, _) = app_with(Reply::Content(GRAPH), Some("/functions/v1/mindmap"));
    let (status, _, _) = send(
        app,
        post(
            "/functions/v1/mindmap/generate",
            Some("good-token"),
            json!({ "topic": "Cells" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (app, _) = app_with(Reply::Content(GRAPH), Some("/functions/v1/mindmap"));
    let (status, _, _) = send(app, post("/generate", Some("good-token"), json!({ "topic": "Cells" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn gateway_round_trip_against_live_router() {
    let (app, _) = app_with(Reply::Content(GRAPH), Some("/functions/v1/mindmap"));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    let base = format!("http://{addr}/functions/v1/mindmap");

    let gateway = Gateway::builder(base.clone())
        .session(Arc::new(StaticToken::new("good-token")))
        .build()
        .unwrap();
    let graph = gateway.generate("Photosynthesis").await.expect("graph");
    assert_eq!(graph.nodes().len(), 3);
    assert!(gateway.ping().await.unwrap().is_ok());

    let anonymous = Gateway::builder(base.clone())
        .session(Arc::new(StaticToken::new("forged")))
        .build()
        .unwrap();
    assert!(matches!(
        anonymous.generate("Photosynthesis").await,
        Err(MindMapError::Unauthorized(_))
    ));

    let misrouted = Gateway::builder(format!("http://{addr}/wrong"))
        .session(Arc::new(StaticToken::new("good-token")))
        .build()
        .unwrap();
    assert!(matches!(
        misrouted.generate("Photosynthesis").await,
        Err(MindMapError::EndpointNotFound(_))
    ));
}
