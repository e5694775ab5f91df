use std::path::PathBuf;

use mindmap_api::Server;
use mindmap_core::ConfigManager;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_dir = std::env::var_os("MINDMAP_CONFIG_DIR").map(PathBuf::from);
    let config = ConfigManager::new(config_dir)?;
    let settings = config.settings();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("mindmap_api={0},mindmap_ai={0},tower_http=info", settings.logging.level)
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    settings.validate_server()?;
    Server::from_settings(settings)?.run().await
}
