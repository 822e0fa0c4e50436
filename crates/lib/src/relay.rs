//! The relay's upstream collaborators, wired once at startup and shared by every request.

use crate::cache::{CacheStore, MemoryCache};
use crate::config::{self, Config, SummarizerBackend};
use crate::llm::{OllamaClient, OpenAiCompatClient, TextGenerator};
use crate::slack::{SlackApi, SlackClient};
use crate::summarize::Summarizer;
use crate::zoho::{ProjectCatalog, TicketBackend, ZohoClient, ZohoOAuth};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

const SLACK_ARCHIVE_BASE: &str = "https://slack.com/archives";

/// Slack, Zoho, the summarizer and the project cache.
#[derive(Clone)]
pub struct Relay {
    pub slack: Arc<dyn SlackApi>,
    pub tickets: Arc<dyn TicketBackend>,
    pub summarizer: Summarizer,
    pub catalog: ProjectCatalog,
    /// Base for permalinks built locally when chat.getPermalink returns none.
    pub archive_base: String,
}

impl Relay {
    pub fn new(
        slack: Arc<dyn SlackApi>,
        tickets: Arc<dyn TicketBackend>,
        generator: Arc<dyn TextGenerator>,
        cache: Arc<dyn CacheStore>,
        projects_ttl: Duration,
    ) -> Self {
        Self {
            catalog: ProjectCatalog::new(cache, tickets.clone(), projects_ttl),
            summarizer: Summarizer::new(generator),
            slack,
            tickets,
            archive_base: SLACK_ARCHIVE_BASE.to_string(),
        }
    }

    pub fn with_archive_base(mut self, archive_base: impl Into<String>) -> Self {
        self.archive_base = archive_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Build real clients from config. Fails when the Slack token or any Zoho credential
    /// is missing.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = config.http.build_client()?;

        let token = config::resolve_slack_token(config).context(
            "slack.botToken is not configured (set it in the config file or SLACK_BOT_TOKEN)",
        )?;
        let slack = SlackClient::new(http.clone(), token, config.slack.api_base.clone());

        let creds = config::resolve_zoho_credentials(config)?;
        let oauth = ZohoOAuth::new(
            http.clone(),
            creds.client_id,
            creds.client_secret,
            creds.refresh_token,
            config.zoho.accounts_base.clone(),
        );
        let tickets = ZohoClient::new(
            http.clone(),
            oauth,
            creds.portal_id,
            config.zoho.api_base.clone(),
            config.zoho.web_base.clone(),
        );

        let generator = build_generator(config, http);

        let relay = Self::new(
            Arc::new(slack),
            Arc::new(tickets),
            generator,
            Arc::new(MemoryCache::new()),
            Duration::from_secs(config.cache.projects_ttl_secs),
        );
        Ok(match config.slack.archive_base {
            Some(ref base) if !base.trim().is_empty() => relay.with_archive_base(base.trim()),
            _ => relay,
        })
    }
}

/// Text-generation backend from `summarizer.backend`.
pub fn build_generator(config: &Config, http: reqwest::Client) -> Arc<dyn TextGenerator> {
    let s = &config.summarizer;
    match s.backend {
        SummarizerBackend::Ollama => {
            log::info!("summarizer backend: ollama");
            Arc::new(OllamaClient::new(http, s.base_url.clone(), s.model.clone()))
        }
        SummarizerBackend::Openai => {
            log::info!("summarizer backend: openai-compatible");
            Arc::new(OpenAiCompatClient::new(
                http,
                s.base_url.clone(),
                s.model.clone(),
                config::resolve_summarizer_api_key(config),
            ))
        }
    }
}
