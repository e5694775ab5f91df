use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mindmap_core::{IdentityConfig, MindMapError, Result};
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::session::{Session, SessionSource, SessionStore, User};

/// Client for a GoTrue-compatible identity service.
///
/// Sessions obtained here are written to the configured [`SessionStore`]; an
/// expiring session is refreshed transparently by [`IdentityClient::get_session`].
pub struct IdentityClient {
    http: Client,
    base_url: String,
    anon_key: SecretString,
    store: Arc<dyn SessionStore>,
}

impl IdentityClient {
    pub fn new(
        base_url: impl Into<String>,
        anon_key: SecretString,
        timeout_secs: u64,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| MindMapError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key,
            store,
        })
    }

    pub fn from_config(config: &IdentityConfig, store: Arc<dyn SessionStore>) -> Result<Self> {
        let url = config
            .url
            .clone()
            .ok_or_else(|| MindMapError::Config("identity.url is not set".into()))?;
        let anon_key = config
            .anon_key
            .clone()
            .ok_or_else(|| MindMapError::Config("identity.anon_key is not set".into()))?;
        Self::new(url, anon_key, config.timeout_secs, store)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn with_apikey(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("apikey", self.anon_key.expose_secret())
    }

    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let response = self
            .send(
                self.with_apikey(self.http.post(self.auth_url("token?grant_type=password")))
                    .json(&json!({ "email": email, "password": password })),
            )
            .await?;
        let session = read_session(response).await?;
        self.store.save(&session)?;
        info!(user = %session.user.id, "signed in");
        Ok(session)
    }

    /// Registers a new account. Returns `None` when the service requires email
    /// confirmation before issuing a session.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>> {
        let response = self
            .send(
                self.with_apikey(self.http.post(self.auth_url("signup")))
                    .json(&json!({ "email": email, "password": password })),
            )
            .await?;
        let body: Value = read_json(response).await?;

        if body.get("access_token").is_none() {
            info!("sign-up accepted, confirmation pending");
            return Ok(None);
        }
        let session = TokenResponse::deserialize(&body)
            .map_err(|e| transport_decode_error(&e))?
            .into_session();
        self.store.save(&session)?;
        Ok(Some(session))
    }

    /// Ends the session remotely and always forgets it locally.
    pub async fn sign_out(&self) -> Result<()> {
        let current = self.store.load()?;
        self.store.clear()?;

        let Some(session) = current else {
            return Ok(());
        };
        let response = self
            .send(
                self.with_apikey(self.http.post(self.auth_url("logout")))
                    .bearer_auth(&session.access_token),
            )
            .await?;
        expect_success(response).await?;
        info!("signed out");
        Ok(())
    }

    /// Current session, refreshed first when it is about to expire.
    pub async fn get_session(&self) -> Result<Option<Session>> {
        let Some(session) = self.store.load()? else {
            return Ok(None);
        };
        if !session.is_expired() {
            return Ok(Some(session));
        }

        let Some(refresh_token) = session.refresh_token.as_deref() else {
            debug!("stored session expired without a refresh token");
            self.store.clear()?;
            return Ok(None);
        };
        match self.refresh_session(refresh_token).await {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!(error = %e, "session refresh failed; signing out locally");
                self.store.clear()?;
                Ok(None)
            }
        }
    }

    pub async fn refresh_session(&self, refresh_token: &str) -> Result<Session> {
        let response = self
            .send(
                self.with_apikey(self.http.post(self.auth_url("token?grant_type=refresh_token")))
                    .json(&json!({ "refresh_token": refresh_token })),
            )
            .await?;
        let session = read_session(response).await?;
        self.store.save(&session)?;
        debug!("session refreshed");
        Ok(session)
    }

    /// Resolves an access token to its user; any rejection is `Unauthorized`.
    pub async fn get_user(&self, access_token: &str) -> Result<User> {
        let response = self
            .send(
                self.with_apikey(self.http.get(self.auth_url("user")))
                    .bearer_auth(access_token),
            )
            .await?;
        read_json(response).await
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        builder.send().await.map_err(|e| MindMapError::TransportError {
            status: 0,
            body: if e.is_timeout() {
                "identity service timed out".to_string()
            } else {
                format!("failed to reach identity service: {e}")
            },
        })
    }
}

#[async_trait]
impl SessionSource for IdentityClient {
    async fn access_token(&self) -> Result<Option<String>> {
        Ok(self.get_session().await?.map(|s| s.access_token))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: User,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let expires_at = self.expires_at.unwrap_or_else(|| {
            chrono::Utc::now().timestamp() + self.expires_in.unwrap_or(3600)
        });
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

async fn read_session(response: Response) -> Result<Session> {
    let token: TokenResponse = read_json(response).await?;
    Ok(token.into_session())
}

async fn read_json<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T> {
    let body = expect_success(response).await?;
    serde_json::from_str(&body).map_err(|e| transport_decode_error(&e))
}

/// Returns the body of a 2xx response; 4xx become `Unauthorized` with the
/// service's own message, anything else is a transport failure.
async fn expect_success(response: Response) -> Result<String> {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if status.is_success() {
        return Ok(body);
    }
    if status.is_client_error() {
        return Err(MindMapError::Unauthorized(error_message(&body)));
    }
    Err(MindMapError::TransportError {
        status: status.as_u16(),
        body,
    })
}

fn transport_decode_error(e: &serde_json::Error) -> MindMapError {
    MindMapError::TransportError {
        status: 200,
        body: format!("unexpected identity response: {e}"),
    }
}

/// GoTrue reports errors under several keys depending on version.
fn error_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|key| v.get(*key).and_then(Value::as_str))
        })
        .map(str::to_string)
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                "request rejected".to_string()
            } else {
                body.trim().to_string()
            }
        })
}
