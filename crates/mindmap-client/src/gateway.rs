use std::sync::Arc;
use std::time::Duration;

use mindmap_core::{
    Envelope, GatewayConfig, Graph, HealthStatus, MindMapError, Result, ValidationError,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::session::SessionSource;

/// A mind-map request the gateway can forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Generate { topic: String },
    Refine { topic: String, feedback: String },
}

impl Operation {
    pub fn generate(topic: impl Into<String>) -> Self {
        Operation::Generate {
            topic: topic.into(),
        }
    }

    pub fn refine(topic: impl Into<String>, feedback: impl Into<String>) -> Self {
        Operation::Refine {
            topic: topic.into(),
            feedback: feedback.into(),
        }
    }

    fn path(&self) -> &'static str {
        match self {
            Operation::Generate { .. } => "generate",
            Operation::Refine { .. } => "refine",
        }
    }

    fn fallback_error(&self) -> &'static str {
        match self {
            Operation::Generate { .. } => "Failed to generate mind map",
            Operation::Refine { .. } => "Failed to refine mind map",
        }
    }

    fn validate(&self) -> std::result::Result<(), ValidationError> {
        match self {
            Operation::Generate { topic } if topic.trim().is_empty() => {
                Err(ValidationError::TopicRequired)
            }
            Operation::Refine { topic, feedback }
                if topic.trim().is_empty() || feedback.trim().is_empty() =>
            {
                Err(ValidationError::FieldsRequired)
            }
            _ => Ok(()),
        }
    }

    fn body(&self) -> Value {
        match self {
            Operation::Generate { topic } => json!({ "topic": topic.trim() }),
            Operation::Refine { topic, feedback } => {
                json!({ "topic": topic.trim(), "feedback": feedback.trim() })
            }
        }
    }
}

/// Calls the mind-map router on behalf of the signed-in user.
pub struct Gateway {
    http: Client,
    base_url: String,
    anon_key: Option<SecretString>,
    session: Arc<dyn SessionSource>,
}

impl Gateway {
    pub fn builder(base_url: impl Into<String>) -> GatewayBuilder {
        GatewayBuilder::new(base_url)
    }

    pub fn from_config(config: &GatewayConfig, session: Arc<dyn SessionSource>) -> Result<Self> {
        let mut builder = GatewayBuilder::new(config.base_url.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .session(session);
        if let Some(key) = &config.anon_key {
            builder = builder.anon_key(key.clone());
        }
        builder.build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn generate(&self, topic: &str) -> Result<Graph> {
        self.call(&Operation::generate(topic)).await
    }

    pub async fn refine(&self, topic: &str, feedback: &str) -> Result<Graph> {
        self.call(&Operation::refine(topic, feedback)).await
    }

    /// Validates locally, attaches the caller's token and returns the router's graph.
    ///
    /// Nothing is sent when the input is invalid or nobody is signed in.
    pub async fn call(&self, operation: &Operation) -> Result<Graph> {
        operation.validate()?;

        let token = self
            .session
            .access_token()
            .await?
            .ok_or(MindMapError::NotAuthenticated)?;

        let url = self.url(operation.path());
        debug!(%url, "forwarding mind-map request");

        let request = self
            .with_apikey(self.http.post(&url))
            .bearer_auth(token)
            .json(&operation.body());
        let response = self.send(request).await?;
        let envelope: Envelope<Value> = read_envelope(response, &url).await?;
        let data = envelope.into_result(operation.fallback_error())?;

        let graph: Graph = serde_json::from_value(data).map_err(|e| {
            warn!(error = %e, "router returned an invalid graph");
            MindMapError::MalformedModelOutput(e.to_string())
        })?;
        info!(
            nodes = graph.nodes().len(),
            edges = graph.edges().len(),
            "mind map received"
        );
        Ok(graph)
    }

    /// Unauthenticated liveness probe.
    pub async fn ping(&self) -> Result<HealthStatus> {
        let url = self.url("ping");
        let response = self.send(self.with_apikey(self.http.get(&url))).await?;
        read_body(response, &url).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn with_apikey(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.anon_key {
            Some(key) => builder.header("apikey", key.expose_secret()),
            None => builder,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        request.send().await.map_err(|e| MindMapError::TransportError {
            status: 0,
            body: if e.is_timeout() {
                "request timed out".to_string()
            } else {
                format!("failed to reach router: {e}")
            },
        })
    }
}

/// Builder for [`Gateway`]; a session source is mandatory.
pub struct GatewayBuilder {
    base_url: String,
    anon_key: Option<SecretString>,
    timeout: Duration,
    session: Option<Arc<dyn SessionSource>>,
}

impl GatewayBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            anon_key: None,
            timeout: Duration::from_secs(120),
            session: None,
        }
    }

    pub fn anon_key(mut self, key: SecretString) -> Self {
        self.anon_key = Some(key);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn session(mut self, session: Arc<dyn SessionSource>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn build(self) -> Result<Gateway> {
        let session = self
            .session
            .ok_or_else(|| MindMapError::Config("gateway needs a session source".into()))?;
        let http = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| MindMapError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Gateway {
            http,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            anon_key: self.anon_key,
            session,
        })
    }
}

async fn read_envelope(response: Response, url: &str) -> Result<Envelope<Value>> {
    read_body(response, url).await
}

async fn read_body<T: DeserializeOwned>(response: Response, url: &str) -> Result<T> {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    match status {
        StatusCode::NOT_FOUND => {
            return Err(MindMapError::EndpointNotFound(format!(
                "{url} is not deployed or the URL is wrong"
            )))
        }
        StatusCode::UNAUTHORIZED => {
            let detail = serde_json::from_str::<Envelope<Value>>(&body)
                .ok()
                .and_then(|e| e.error)
                .unwrap_or_else(|| "request rejected".to_string());
            return Err(MindMapError::Unauthorized(detail));
        }
        s if !s.is_success() => {
            return Err(MindMapError::TransportError {
                status: s.as_u16(),
                body: if body.is_empty() {
                    s.to_string()
                } else {
                    body
                },
            });
        }
        _ => {}
    }

    serde_json::from_str(&body).map_err(|e| MindMapError::TransportError {
        status: status.as_u16(),
        body: format!("response is not valid JSON ({e}): {body}"),
    })
}
