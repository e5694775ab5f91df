use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use mindmap_core::{ConfigManager, MindMapError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

use commands::AppContext;
use output::{print_output, OutputFormat};

#[derive(Parser)]
#[command(name = "mindmap")]
#[command(about = "MindMap CLI - AI-generated mind maps for studying", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output format (json, pretty)
    #[arg(short, long, global = true, value_enum, default_value = "pretty")]
    output: OutputFormat,

    /// Directory holding default.toml / local.toml and the saved session
    #[arg(long, global = true, env = "MINDMAP_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in with email and password
    Login {
        email: String,

        /// Password; prompted for when omitted
        #[arg(long, env = "MINDMAP_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create an account
    Signup {
        email: String,

        /// Password; prompted for (with confirmation) when omitted
        #[arg(long, env = "MINDMAP_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Forget the saved session and revoke it remotely
    Logout,

    /// Show who is signed in
    Status,

    /// Generate a mind map for a topic
    Generate {
        topic: String,

        /// Also write the diagram as SVG
        #[arg(long)]
        svg: Option<PathBuf>,
    },

    /// Regenerate a mind map taking feedback into account
    Refine {
        topic: String,

        /// What to change, e.g. "focus more on the Calvin cycle"
        #[arg(short, long)]
        feedback: String,

        /// Also write the diagram as SVG
        #[arg(long)]
        svg: Option<PathBuf>,
    },

    /// Check that the router is reachable
    Ping,

    /// Draw a saved mind map (JSON) as SVG
    Render {
        /// Graph JSON file, e.g. saved with `generate --output json`
        graph: PathBuf,

        /// Where to write the SVG
        #[arg(long)]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigManager::new(cli.config_dir.clone()).context("Failed to load configuration")?;

    let default_level = if cli.verbose {
        "debug".to_string()
    } else {
        format!("warn,mindmap_cli={}", config.settings().logging.level)
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let ctx = AppContext::new(config.settings().clone(), config.config_dir());

    match commands::execute(&cli, &ctx).await {
        Ok(output) => {
            print_output(cli.output, &output)?;
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            if let Some(hint) = hint_for(&e) {
                eprintln!("{} {}", "Hint:".yellow().bold(), hint);
            }
            std::process::exit(1);
        }
    }
}

fn hint_for(err: &anyhow::Error) -> Option<&'static str> {
    match err.downcast_ref::<MindMapError>()? {
        MindMapError::NotAuthenticated => Some("run `mindmap login <email>` first"),
        MindMapError::Unauthorized(_) => Some("your session was rejected; run `mindmap login` again"),
        MindMapError::EndpointNotFound(_) => Some(
            "the mind-map endpoint was not found; check gateway.base_url and that the router is deployed",
        ),
        MindMapError::TransportError { status: 0, .. } => {
            Some("the router could not be reached; check gateway.base_url and your connection")
        }
        _ => None,
    }
}
