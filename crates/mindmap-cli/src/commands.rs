use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use mindmap_client::{FileSessionStore, Gateway, IdentityClient, SessionStore};
use mindmap_core::{Graph, Settings};
use mindmap_render::{render_svg, Style};
use serde_json::json;
use tracing::info;

use crate::output::CommandOutput;
use crate::{Cli, Commands};

/// Collaborators built from configuration once per invocation.
pub struct AppContext {
    settings: Settings,
    session_file: PathBuf,
}

impl AppContext {
    pub fn new(settings: Settings, config_dir: &Path) -> Self {
        let session_file = settings
            .gateway
            .session_file
            .clone()
            .unwrap_or_else(|| config_dir.join("session.json"));
        Self {
            settings,
            session_file,
        }
    }

    fn store(&self) -> Arc<dyn SessionStore> {
        Arc::new(FileSessionStore::new(self.session_file.clone()))
    }

    fn identity(&self) -> Result<Arc<IdentityClient>> {
        self.settings
            .validate_client()
            .context("client configuration is incomplete")?;
        let identity = IdentityClient::from_config(&self.settings.identity, self.store())?;
        Ok(Arc::new(identity))
    }

    fn gateway(&self) -> Result<Gateway> {
        let identity = self.identity()?;
        Ok(Gateway::from_config(&self.settings.gateway, identity)?)
    }

    /// Gateway for unauthenticated calls; needs no identity settings.
    fn anonymous_gateway(&self) -> Result<Gateway> {
        Ok(Gateway::from_config(
            &self.settings.gateway,
            Arc::new(mindmap_client::StaticToken::none()),
        )?)
    }
}

pub async fn execute(cli: &Cli, ctx: &AppContext) -> Result<CommandOutput> {
    match &cli.command {
        Commands::Login { email, password } => {
            let password = resolve_password(password.as_deref(), false)?;
            let session = ctx
                .identity()?
                .sign_in_with_password(email, &password)
                .await
                .context("sign-in failed")?;
            info!(user = %session.user.id, "session stored at {:?}", ctx.session_file);
            Ok(CommandOutput::Message(format!(
                "Signed in as {}",
                session.user.email.as_deref().unwrap_or(&session.user.id)
            )))
        }

        Commands::Signup { email, password } => {
            let password = resolve_password(password.as_deref(), true)?;
            let session = ctx
                .identity()?
                .sign_up(email, &password)
                .await
                .context("sign-up failed")?;
            Ok(CommandOutput::Message(match session {
                Some(_) => format!("Account created; signed in as {email}"),
                None => format!("Account created; confirm the email sent to {email}, then log in"),
            }))
        }

        Commands::Logout => {
            ctx.identity()?.sign_out().await.context("sign-out failed")?;
            Ok(CommandOutput::Message("Signed out".to_string()))
        }

        Commands::Status => {
            let session = ctx.identity()?.get_session().await?;
            Ok(CommandOutput::Value(match session {
                Some(session) => json!({
                    "signed_in": true,
                    "user": session.user.id,
                    "email": session.user.email,
                    "expires_at": session.expires_at,
                }),
                None => json!({ "signed_in": false }),
            }))
        }

        Commands::Generate { topic, svg } => {
            let graph = ctx.gateway()?.generate(topic).await?;
            write_svg(&graph, svg.as_deref())?;
            Ok(CommandOutput::Graph(graph))
        }

        Commands::Refine {
            topic,
            feedback,
            svg,
        } => {
            let graph = ctx.gateway()?.refine(topic, feedback).await?;
            write_svg(&graph, svg.as_deref())?;
            Ok(CommandOutput::Graph(graph))
        }

        Commands::Ping => {
            let status = ctx.anonymous_gateway()?.ping().await?;
            Ok(CommandOutput::Value(json!({
                "status": status.status,
                "timestamp": status.timestamp,
            })))
        }

        Commands::Render { graph, out } => {
            let raw = std::fs::read_to_string(graph)
                .with_context(|| format!("reading {}", graph.display()))?;
            let graph = Graph::from_json_str(&raw)
                .with_context(|| format!("{} is not a valid mind map", graph.display()))?;
            write_svg(&graph, Some(out.as_path()))?;
            Ok(CommandOutput::Message(format!("Wrote {}", out.display())))
        }
    }
}

fn write_svg(graph: &Graph, path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    std::fs::write(path, render_svg(graph, &Style::default()))
        .with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "diagram written");
    Ok(())
}

fn resolve_password(given: Option<&str>, confirm: bool) -> Result<String> {
    if let Some(password) = given {
        return Ok(password.to_string());
    }
    let mut prompt = dialoguer::Password::new().with_prompt("Password");
    if confirm {
        prompt = prompt.with_confirmation("Confirm password", "Passwords do not match");
    }
    let password = prompt.interact().context("reading password")?;
    if password.is_empty() {
        bail!("password must not be empty");
    }
    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_file_defaults_into_config_dir() {
        let ctx = AppContext::new(Settings::default(), Path::new("/tmp/mindmap-config"));
        assert_eq!(
            ctx.session_file,
            PathBuf::from("/tmp/mindmap-config/session.json")
        );

        let mut settings = Settings::default();
        settings.gateway.session_file = Some(PathBuf::from("/elsewhere/s.json"));
        let ctx = AppContext::new(settings, Path::new("/tmp/mindmap-config"));
        assert_eq!(ctx.session_file, PathBuf::from("/elsewhere/s.json"));
    }

    #[test]
    fn identity_requires_client_settings() {
        let ctx = AppContext::new(Settings::default(), Path::new("."));
        assert!(ctx.identity().is_err());
    }

    #[test]
    fn write_svg_is_optional() {
        let graph = Graph::from_json_str(r#"{"nodes":[{"id":"1","label":"A"}],"edges":[]}"#)
            .unwrap();
        write_svg(&graph, None).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.svg");
        write_svg(&graph, Some(&path)).unwrap();
        assert!(std::fs::read_to_string(path).unwrap().contains("<svg"));
    }
}
