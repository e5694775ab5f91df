use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::header, http::request::Parts};
use mindmap_client::IdentityClient;
use mindmap_core::{MindMapError, Result};
use tracing::{debug, warn};

use crate::{error::ApiError, AppState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedUser {
    pub id: String,
    pub email: Option<String>,
}

/// Resolves a bearer token to a user. Every failure must come back as an
/// auth error so the router answers 401, never 500.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<VerifiedUser>;
}

#[async_trait]
impl IdentityVerifier for IdentityClient {
    async fn verify(&self, token: &str) -> Result<VerifiedUser> {
        match self.get_user(token).await {
            Ok(user) => Ok(VerifiedUser {
                id: user.id,
                email: user.email,
            }),
            Err(err @ MindMapError::Unauthorized(_)) => Err(err),
            Err(err) => {
                warn!(error = %err, "identity lookup failed");
                Err(MindMapError::Unauthorized("Authentication failed".into()))
            }
        }
    }
}

/// Extractor for POST handlers; runs before the body is touched.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub VerifiedUser);

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(MindMapError::MissingAuthorization)?;

        let token = header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                MindMapError::Unauthorized("Invalid authorization header format".into())
            })?;

        let user = state.identity.verify(token).await.map_err(|err| {
            if err.is_auth_failure() {
                err
            } else {
                MindMapError::Unauthorized("Authentication failed".into())
            }
        })?;
        debug!(user = %user.id, "request authenticated");
        Ok(Self(user))
    }
}
