pub mod config;
pub mod envelope;
pub mod error;
pub mod model;

pub use config::{
    ConfigManager, GatewayConfig, IdentityConfig, LlmConfig, LoggingConfig, ServerConfig, Settings,
};
pub use envelope::{Envelope, HealthStatus};
pub use error::*;
pub use model::{parse_graph_value, Edge, Graph, GraphParseError, GraphValidationError, Node};
