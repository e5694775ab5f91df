use axum::{body::Bytes, extract::State, Json};
use mindmap_core::{Envelope, Graph, HealthStatus, MindMapError};
use serde_json::Value;
use tracing::info;

use crate::{auth::AuthenticatedUser, error::ApiResult, AppState};

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        timestamp: Some(chrono::Utc::now().to_rfc3339()),
    })
}

pub async fn generate(
    AuthenticatedUser(user): AuthenticatedUser,
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<Envelope<Graph>>> {
    let body = RequestBody::parse(&body);
    let topic = body.text("topic");
    info!(user = %user.id, topic, "generate requested");

    let graph = state.generator.generate(topic).await?;
    Ok(Json(Envelope::ok(graph)))
}

pub async fn refine(
    AuthenticatedUser(user): AuthenticatedUser,
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<Envelope<Graph>>> {
    let body = RequestBody::parse(&body);
    let (topic, feedback) = (body.text("topic"), body.text("feedback"));
    info!(user = %user.id, topic, "refine requested");

    let graph = state.generator.refine(topic, feedback).await?;
    Ok(Json(Envelope::ok(graph)))
}

pub async fn method_not_allowed() -> ApiResult<()> {
    Err(MindMapError::MethodNotAllowed.into())
}

pub async fn not_found() -> ApiResult<()> {
    Err(MindMapError::NotFound.into())
}

/// Lenient view of a JSON request body: anything unparseable, or a field that
/// is absent or not a string, reads as empty and fails validation downstream.
struct RequestBody(Value);

impl RequestBody {
    fn parse(raw: &[u8]) -> Self {
        Self(serde_json::from_slice(raw).unwrap_or(Value::Null))
    }

    fn text(&self, field: &str) -> &str {
        self.0.get(field).and_then(Value::as_str).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_tolerates_garbage() {
        assert_eq!(RequestBody::parse(b"not json").text("topic"), "");
        assert_eq!(RequestBody::parse(b"").text("topic"), "");
        assert_eq!(RequestBody::parse(br#"{"topic": 5}"#).text("topic"), "");
        assert_eq!(
            RequestBody::parse(br#"{"topic": "Cells"}"#).text("topic"),
            "Cells"
        );
    }
}
