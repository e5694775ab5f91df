use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config as cfg;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Environment variable prefix for structured overrides, e.g. `MINDMAP__SERVER__PORT=8080`.
pub const ENV_PREFIX: &str = "MINDMAP";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_host")]
    pub host: String,
    #[serde(default = "ServerConfig::default_port")]
    pub port: u16,
    /// Optional mount prefix such as `/functions/v1/mindmap`.
    #[serde(default)]
    pub base_path: Option<String>,
}

impl ServerConfig {
    fn default_host() -> String {
        "127.0.0.1".to_string()
    }

    fn default_port() -> u16 {
        3000
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            base_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Base URL of the GoTrue-compatible identity service (the `/auth/v1` routes hang off it).
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, skip_serializing)]
    pub anon_key: Option<SecretString>,
    #[serde(default = "IdentityConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl IdentityConfig {
    fn default_timeout_secs() -> u64 {
        30
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "LlmConfig::default_provider")]
    pub provider: String,
    #[serde(default = "LlmConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "LlmConfig::default_model")]
    pub model: String,
    #[serde(default = "LlmConfig::default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default, skip_serializing)]
    pub api_key: Option<SecretString>,
}

impl LlmConfig {
    fn default_provider() -> String {
        "deepseek".to_string()
    }

    fn default_base_url() -> String {
        "https://api.deepseek.com/v1".to_string()
    }

    fn default_model() -> String {
        "deepseek-chat".to_string()
    }

    fn default_timeout_secs() -> u64 {
        120
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: Self::default_provider(),
            base_url: Self::default_base_url(),
            model: Self::default_model(),
            timeout_secs: Self::default_timeout_secs(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Where the router is reachable, including any deployment prefix.
    #[serde(default = "GatewayConfig::default_base_url")]
    pub base_url: String,
    /// Public key sent as the `apikey` header.
    #[serde(default, skip_serializing)]
    pub anon_key: Option<SecretString>,
    #[serde(default = "GatewayConfig::default_timeout_secs")]
    pub timeout_secs: u64,
    /// Where the CLI keeps its signed-in session; defaults to `<config dir>/session.json`.
    #[serde(default)]
    pub session_file: Option<PathBuf>,
}

impl GatewayConfig {
    fn default_base_url() -> String {
        "http://127.0.0.1:3000".to_string()
    }

    fn default_timeout_secs() -> u64 {
        120
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            anon_key: None,
            timeout_secs: Self::default_timeout_secs(),
            session_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "Settings::default_env")]
    pub env: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            env: Self::default_env(),
            server: ServerConfig::default(),
            identity: IdentityConfig::default(),
            llm: LlmConfig::default(),
            gateway: GatewayConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Settings {
    fn default_env() -> String {
        env::var("APP_ENV")
            .ok()
            .or_else(|| env::var("RUST_ENV").ok())
            .unwrap_or_else(|| "development".to_string())
    }

    /// Checks what the router process needs: bind address, identity provider and model key.
    pub fn validate_server(&self) -> Result<()> {
        anyhow::ensure!(
            !self.server.host.trim().is_empty(),
            "server.host cannot be empty"
        );
        if let Some(base_path) = &self.server.base_path {
            anyhow::ensure!(
                base_path.starts_with('/') && base_path.len() > 1,
                "server.base_path must start with '/' and name a segment"
            );
        }
        self.validate_identity()?;
        anyhow::ensure!(
            self.llm.api_key.is_some(),
            "llm.api_key is not set (config file, MINDMAP__LLM__API_KEY or DEEPSEEK_API_KEY)"
        );
        anyhow::ensure!(!self.llm.model.trim().is_empty(), "llm.model cannot be empty");
        anyhow::ensure!(
            is_http_url(&self.llm.base_url),
            "llm.base_url must be an http(s) URL"
        );
        Ok(())
    }

    /// Checks what the client side needs: gateway target and identity provider.
    pub fn validate_client(&self) -> Result<()> {
        anyhow::ensure!(
            is_http_url(&self.gateway.base_url),
            "gateway.base_url must be an http(s) URL"
        );
        self.validate_identity()
    }

    fn validate_identity(&self) -> Result<()> {
        match &self.identity.url {
            Some(url) => anyhow::ensure!(is_http_url(url), "identity.url must be an http(s) URL"),
            None => anyhow::bail!("identity.url is not set (config file or SUPABASE_URL)"),
        }
        anyhow::ensure!(
            self.identity.anon_key.is_some(),
            "identity.anon_key is not set (config file or SUPABASE_ANON_KEY)"
        );
        Ok(())
    }
}

fn is_http_url(raw: &str) -> bool {
    raw.starts_with("http://") || raw.starts_with("https://")
}

/// Loads [`Settings`] from layered sources.
///
/// Precedence, lowest first: built-in defaults, `default.*`, `{env}.*`, `local.toml`,
/// `MINDMAP__*` variables, then the conventional provider variables
/// (`SUPABASE_URL`, `SUPABASE_ANON_KEY`, `DEEPSEEK_API_KEY`).
#[derive(Debug)]
pub struct ConfigManager {
    settings: Settings,
    config_dir: PathBuf,
}

impl ConfigManager {
    pub fn new(config_dir: Option<PathBuf>) -> Result<Self> {
        let config_dir = config_dir.unwrap_or_else(Self::default_config_dir);
        let env_name = Settings::default_env();
        let settings = Self::load_from_sources(&config_dir, &env_name)?;
        Ok(Self {
            settings,
            config_dir,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn into_settings(self) -> Settings {
        self.settings
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Priority order: `~/.mindmap/`, then `./config/`, then the current directory.
    pub fn default_config_dir() -> PathBuf {
        if let Some(home_dir) = dirs::home_dir() {
            let mindmap_dir = home_dir.join(".mindmap");
            if mindmap_dir.exists() {
                info!("Using config directory: {:?}", mindmap_dir);
                return mindmap_dir;
            }
        }

        let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let project_config = cwd.join("config");
        if project_config.exists() {
            info!("Using config directory: {:?}", project_config);
            return project_config;
        }

        info!("Using config directory: {:?}", cwd);
        cwd
    }

    pub fn load_from_sources(config_dir: &Path, env_name: &str) -> Result<Settings> {
        let builder = cfg::Config::builder()
            .add_source(cfg::File::from(config_dir.join("default.toml")).required(false))
            .add_source(cfg::File::from(config_dir.join("default.yaml")).required(false))
            .add_source(cfg::File::from(config_dir.join("default.json")).required(false))
            .add_source(
                cfg::File::from(config_dir.join(format!("{}.toml", env_name))).required(false),
            )
            .add_source(
                cfg::File::from(config_dir.join(format!("{}.yaml", env_name))).required(false),
            )
            .add_source(
                cfg::File::from(config_dir.join(format!("{}.json", env_name))).required(false),
            )
            .add_source(cfg::File::from(config_dir.join("local.toml")).required(false))
            .add_source(cfg::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .set_override_option("identity.url", non_empty_env("SUPABASE_URL"))?
            .set_override_option("identity.anon_key", non_empty_env("SUPABASE_ANON_KEY"))?
            .set_override_option("gateway.anon_key", non_empty_env("SUPABASE_ANON_KEY"))?
            .set_override_option("llm.api_key", non_empty_env("DEEPSEEK_API_KEY"))?;

        let settings: Settings = builder
            .build()
            .context("building configuration")?
            .try_deserialize()
            .context("deserializing configuration")?;
        Ok(settings)
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
