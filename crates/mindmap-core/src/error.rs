use thiserror::Error;

/// Missing or empty request fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Topic is required")]
    TopicRequired,

    #[error("Topic and feedback are required")]
    FieldsRequired,
}

/// Failure taxonomy shared by every boundary: generator, router and gateway.
#[derive(Error, Debug)]
pub enum MindMapError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Missing authorization header")]
    MissingAuthorization,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Transport error ({status}): {body}")]
    TransportError { status: u16, body: String },

    #[error("Endpoint not found: {0}")]
    EndpointNotFound(String),

    #[error("{0}")]
    OperationFailed(String),

    #[error("Model provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Invalid response format from model: {0}")]
    MalformedModelOutput(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Not Found")]
    NotFound,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MindMapError {
    /// HTTP status this failure maps to when it crosses the router boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            MindMapError::NotAuthenticated
            | MindMapError::MissingAuthorization
            | MindMapError::Unauthorized(_) => 401,
            MindMapError::Validation(_) => 400,
            MindMapError::EndpointNotFound(_) | MindMapError::NotFound => 404,
            MindMapError::MethodNotAllowed => 405,
            MindMapError::TransportError { .. } => 502,
            MindMapError::OperationFailed(_)
            | MindMapError::ProviderUnavailable(_)
            | MindMapError::MalformedModelOutput(_)
            | MindMapError::Config(_)
            | MindMapError::Io(_) => 500,
        }
    }

    pub fn is_auth_failure(&self) -> bool {
        self.status_code() == 401
    }
}

pub type Result<T> = std::result::Result<T, MindMapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_map_to_401() {
        assert_eq!(MindMapError::MissingAuthorization.status_code(), 401);
        assert_eq!(MindMapError::Unauthorized("expired".into()).status_code(), 401);
        assert!(MindMapError::NotAuthenticated.is_auth_failure());
        assert!(!MindMapError::ProviderUnavailable("down".into()).is_auth_failure());
    }

    #[test]
    fn validation_messages_match_envelope_text() {
        let err: MindMapError = ValidationError::TopicRequired.into();
        assert_eq!(err.to_string(), "Topic is required");
        assert_eq!(err.status_code(), 400);

        let err: MindMapError = ValidationError::FieldsRequired.into();
        assert_eq!(err.to_string(), "Topic and feedback are required");
    }

    #[test]
    fn generator_failures_map_to_500() {
        assert_eq!(MindMapError::ProviderUnavailable("x".into()).status_code(), 500);
        assert_eq!(MindMapError::MalformedModelOutput("x".into()).status_code(), 500);
    }
}
