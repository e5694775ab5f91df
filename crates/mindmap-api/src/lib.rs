//! HTTP router for MindMap: CORS, bearer authentication, and the
//! generate/refine endpoints backed by [`mindmap_ai::MindMapGenerator`].

pub mod auth;
pub mod cors;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

pub use auth::{AuthenticatedUser, IdentityVerifier, VerifiedUser};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use server::Server;
pub use state::AppState;
