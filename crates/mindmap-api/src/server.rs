use std::net::SocketAddr;

use anyhow::Context;
use mindmap_core::Settings;
use tokio::signal;
use tracing::{info, warn};

use crate::{create_router, AppState};

pub struct Server {
    state: AppState,
    addr: SocketAddr,
    base_path: Option<String>,
}

impl Server {
    pub fn new(state: AppState, addr: SocketAddr, base_path: Option<String>) -> Self {
        Self {
            state,
            addr,
            base_path,
        }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
            .parse()
            .with_context(|| {
                format!(
                    "invalid listen address {}:{}",
                    settings.server.host, settings.server.port
                )
            })?;
        let state = AppState::from_settings(settings)?;
        Ok(Self::new(state, addr, settings.server.base_path.clone()))
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let router = create_router(self.state, self.base_path.as_deref());
        let prefix = self.base_path.as_deref().unwrap_or("");

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("binding {}", self.addr))?;

        info!("MindMap router listening on http://{}{}", self.addr, prefix);
        info!("  GET  {prefix}/health, {prefix}/ping - liveness");
        info!("  POST {prefix}/generate - build a mind map for a topic");
        info!("  POST {prefix}/refine - rebuild a mind map with feedback");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("serving HTTP")?;

        info!("server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully");
        },
    }
}
