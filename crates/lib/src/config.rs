//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.ticketrelay/config.json`) and environment.
//! Secrets (Slack bot token, Zoho OAuth triple, portal id) may come from either; env wins.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Gateway server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Slack Web API settings.
    #[serde(default)]
    pub slack: SlackConfig,

    /// Zoho Projects OAuth and portal settings.
    #[serde(default)]
    pub zoho: ZohoConfig,

    /// Text-generation backend used to summarize messages.
    #[serde(default)]
    pub summarizer: SummarizerConfig,

    /// Reference-list cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Outbound HTTP settings shared by all upstream clients.
    #[serde(default)]
    pub http: HttpConfig,
}

/// Gateway bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for the webhook endpoint (default 8787).
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    8787
}

fn default_gateway_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

/// Slack config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlackConfig {
    /// Bot token (xoxb-...). Overridden by SLACK_BOT_TOKEN env when set.
    pub bot_token: Option<String>,
    /// Web API base (default https://slack.com/api).
    pub api_base: Option<String>,
    /// Archive base used to build a permalink when chat.getPermalink returns none (default https://slack.com/archives).
    pub archive_base: Option<String>,
}

/// Zoho Projects config. Every field except the base URLs is required to serve.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZohoConfig {
    /// OAuth client id. Overridden by ZOHO_CLIENT_ID env.
    pub client_id: Option<String>,
    /// OAuth client secret. Overridden by ZOHO_CLIENT_SECRET env.
    pub client_secret: Option<String>,
    /// Long-lived refresh token. Overridden by ZOHO_REFRESH_TOKEN env.
    pub refresh_token: Option<String>,
    /// Portal id. Overridden by ZOHO_PORTAL_ID env.
    pub portal_id: Option<String>,
    /// Accounts server (default https://accounts.zoho.com).
    pub accounts_base: Option<String>,
    /// Projects REST API (default https://projectsapi.zoho.com).
    pub api_base: Option<String>,
    /// Projects web UI, used for task links the API does not return (default https://projects.zoho.com).
    pub web_base: Option<String>,
}

/// Which text-generation backend summarizes messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummarizerBackend {
    /// Ollama native /api/generate.
    #[default]
    #[serde(alias = "Ollama")]
    Ollama,
    /// Any OpenAI-compatible /chat/completions endpoint (LM Studio, vLLM and the like).
    #[serde(alias = "openAi", alias = "OpenAI", alias = "openai-compatible")]
    Openai,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizerConfig {
    #[serde(default)]
    pub backend: SummarizerBackend,
    /// Backend base URL. Defaults per backend when unset.
    pub base_url: Option<String>,
    /// Model id passed as-is to the backend.
    pub model: Option<String>,
    /// Bearer key for OpenAI-compatible endpoints. Overridden by SUMMARIZER_API_KEY env.
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfig {
    /// Expiry of the cached project list in seconds (default 3600).
    #[serde(default = "default_projects_ttl_secs")]
    pub projects_ttl_secs: u64,
}

fn default_projects_ttl_secs() -> u64 {
    3600
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            projects_ttl_secs: default_projects_ttl_secs(),
        }
    }
}

/// Outbound HTTP policy. No timeout unless one is configured.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpConfig {
    pub timeout_secs: Option<u64>,
}

impl HttpConfig {
    /// Build the reqwest client every upstream adapter shares.
    pub fn build_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = self.timeout_secs.filter(|s| *s > 0) {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        builder.build().context("building http client")
    }
}

/// Env var value when set and non-blank, else the trimmed config value when non-blank.
fn env_or(var: &str, configured: Option<&String>) -> Option<String> {
    std::env::var(var)
        .ok()
        .and_then(|s| {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .or_else(|| {
            configured
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// Resolve the Slack bot token: env SLACK_BOT_TOKEN overrides config.
pub fn resolve_slack_token(config: &Config) -> Option<String> {
    env_or("SLACK_BOT_TOKEN", config.slack.bot_token.as_ref())
}

/// Resolve the summarizer API key: env SUMMARIZER_API_KEY overrides config.
pub fn resolve_summarizer_api_key(config: &Config) -> Option<String> {
    env_or("SUMMARIZER_API_KEY", config.summarizer.api_key.as_ref())
}

/// Zoho credentials with every required field present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZohoCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub portal_id: String,
}

/// Resolve Zoho credentials from env (ZOHO_*) and config. Errors name the first missing one.
pub fn resolve_zoho_credentials(config: &Config) -> Result<ZohoCredentials> {
    let z = &config.zoho;
    let field = |var: &str, value: Option<&String>, key: &str| {
        env_or(var, value).with_context(|| {
            format!("zoho.{} is not configured (set it in the config file or {})", key, var)
        })
    };
    Ok(ZohoCredentials {
        client_id: field("ZOHO_CLIENT_ID", z.client_id.as_ref(), "clientId")?,
        client_secret: field("ZOHO_CLIENT_SECRET", z.client_secret.as_ref(), "clientSecret")?,
        refresh_token: field("ZOHO_REFRESH_TOKEN", z.refresh_token.as_ref(), "refreshToken")?,
        portal_id: field("ZOHO_PORTAL_ID", z.portal_id.as_ref(), "portalId")?,
    })
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("TICKETRELAY_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".ticketrelay").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path (or the default). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

/// Write a default config (empty secrets, default endpoints) if none exists at `path`.
/// Returns true when a file was written.
pub fn write_default_config(path: &std::path::Path) -> Result<bool> {
    if path.exists() {
        log::debug!("config already exists at {}, skipping", path.display());
        return Ok(false);
    }
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating config directory {}", dir.display()))?;
    }
    let template = serde_json::json!({
        "gateway": { "port": default_gateway_port(), "bind": default_gateway_bind() },
        "slack": { "botToken": "" },
        "zoho": { "clientId": "", "clientSecret": "", "refreshToken": "", "portalId": "" },
        "summarizer": { "backend": "ollama" },
        "cache": { "projectsTtlSecs": default_projects_ttl_secs() }
    });
    let text = serde_json::to_string_pretty(&template).context("encoding default config")?;
    std::fs::write(path, text)
        .with_context(|| format!("writing default config to {}", path.display()))?;
    log::info!("created default config at {}", path.display());
    Ok(true)
}
