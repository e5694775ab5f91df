use serde::{Deserialize, Serialize};

use crate::error::MindMapError;

/// Uniform `{ success, data?, error? }` wrapper returned at every network boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Unwraps a successful envelope, or turns it into `OperationFailed` with the
    /// envelope's error text (falling back to `fallback` when the server sent none).
    pub fn into_result(self, fallback: &str) -> Result<T, MindMapError> {
        match self {
            Envelope {
                success: true,
                data: Some(data),
                ..
            } => Ok(data),
            Envelope { error, .. } => Err(MindMapError::OperationFailed(
                error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| fallback.to_string()),
            )),
        }
    }
}

/// Liveness payload for `GET /health` and `GET /ping`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn failure_omits_data() {
        let env: Envelope<()> = Envelope::failure("Topic is required");
        assert_eq!(
            serde_json::to_value(&env).unwrap(),
            json!({ "success": false, "error": "Topic is required" })
        );
    }

    #[test]
    fn success_without_data_is_operation_failure() {
        let env: Envelope<u32> = serde_json::from_value(json!({ "success": true })).unwrap();
        let err = env.into_result("Failed to generate mind map").unwrap_err();
        assert_eq!(err.to_string(), "Failed to generate mind map");
    }

    #[test]
    fn failure_carries_server_error_text() {
        let env: Envelope<u32> =
            serde_json::from_value(json!({ "success": false, "error": "quota exceeded" })).unwrap();
        assert!(matches!(
            env.into_result("fallback"),
            Err(MindMapError::OperationFailed(msg)) if msg == "quota exceeded"
        ));
    }

    #[test]
    fn ok_round_trips_data() {
        let env = Envelope::ok(7u32);
        assert_eq!(env.into_result("unused").unwrap(), 7);
    }
}
